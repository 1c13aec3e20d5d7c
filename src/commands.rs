use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::loadout::cooldown::CooldownKind;
use crate::loadout::select::SelectOutcome;
use crate::loadout::team::MatchTeam;
use crate::menu::{Menu, MenuItem};
use crate::session::{Category, GameSession, PlayerRef};
use crate::util::state::AppState;

/// How a chat command ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Done { messages: Vec<String> },
    Throttled { remaining: Duration },
    Disabled,
    SessionGone,
}

/// How a menu-open request ended.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuOutcome {
    Menu(Menu),
    Throttled { remaining: Duration },
    Disabled,
    NotFound,
    SessionGone,
}

/// Re-hydrates the player from durable storage and re-applies every enabled
/// category's visuals. The storage read runs off the foreground path.
pub fn refresh(state: &Arc<AppState>, player: &PlayerRef) -> CommandOutcome {
    if !state.config.categories.enabled(Category::Skins) {
        return CommandOutcome::Disabled;
    }
    if !state.session.is_valid(player) {
        return CommandOutcome::SessionGone;
    }
    if let Err(remaining) =
        state
            .cooldowns
            .try_acquire(CooldownKind::Command, player.slot, Instant::now())
    {
        return CommandOutcome::Throttled { remaining };
    }

    let state = Arc::clone(state);
    let player = player.clone();
    tokio::spawn(async move {
        state.store.clear_player(player.slot);
        match state.sync.hydrate(&player, &state.store).await {
            Ok(_) => apply_all_visuals(&state, &player),
            Err(err) => warn!(slot = player.slot, %err, "refresh hydration failed"),
        }
    });
    CommandOutcome::Done {
        messages: vec!["Your loadout is being refreshed.".to_owned()],
    }
}

/// Lists what the player can customize on this server.
pub fn info(state: &AppState, player: &PlayerRef) -> CommandOutcome {
    if !state.session.is_valid(player) {
        return CommandOutcome::SessionGone;
    }
    let mut messages = Vec::new();
    if let Some(website) = &state.config.website {
        messages.push(format!("Browse finishes at {website}"));
    }
    messages.push("Use the refresh command after changing your loadout.".to_owned());
    for category in [
        Category::Skins,
        Category::Knives,
        Category::Gloves,
        Category::Agents,
        Category::Music,
        Category::Pins,
    ] {
        if state.config.categories.enabled(category) {
            messages.push(format!("{} selection is enabled.", category.label()));
        }
    }
    CommandOutcome::Done { messages }
}

pub fn stattrak(state: &AppState, player: &PlayerRef) -> SelectOutcome {
    if !state.config.categories.enabled(Category::Skins) {
        return SelectOutcome::NotFound;
    }
    state.pipeline.toggle_stattrak(player)
}

/// Opens a top-level category menu. Opening is command-cooldown gated,
/// like any other command; picking inside it is gated separately.
pub fn open_menu(state: &AppState, player: &PlayerRef, category: Category) -> MenuOutcome {
    if !state.config.categories.enabled(category) {
        return MenuOutcome::Disabled;
    }
    if !state.session.is_valid(player) {
        return MenuOutcome::SessionGone;
    }
    if let Err(remaining) =
        state
            .cooldowns
            .try_acquire(CooldownKind::Command, player.slot, Instant::now())
    {
        return MenuOutcome::Throttled { remaining };
    }
    match category {
        Category::Skins => MenuOutcome::Menu(weapon_menu(state)),
        Category::Knives => MenuOutcome::Menu(knife_menu(state)),
        Category::Gloves => MenuOutcome::Menu(glove_menu(state)),
        Category::Agents => match state.session.current_side(player) {
            MatchTeam::Playing(side) => MenuOutcome::Menu(Menu {
                title: "Agents".to_owned(),
                items: state
                    .catalogs
                    .agents_for_side(side)
                    .map(|agent| MenuItem::new(agent.name.clone(), agent.name.clone()))
                    .collect(),
            }),
            _ => MenuOutcome::NotFound,
        },
        Category::Music => MenuOutcome::Menu(music_menu(state)),
        Category::Pins => MenuOutcome::Menu(pin_menu(state)),
    }
}

/// The skins submenu for one weapon. Reached from an item of the weapon
/// menu, so it carries no gate of its own.
pub fn skins_for_weapon_menu(
    state: &AppState,
    player: &PlayerRef,
    weapon_class: &str,
) -> MenuOutcome {
    if !state.config.categories.enabled(Category::Skins) {
        return MenuOutcome::Disabled;
    }
    if !state.session.is_valid(player) {
        return MenuOutcome::SessionGone;
    }
    let Some(weapon) = state.catalogs.weapon_by_class(weapon_class) else {
        return MenuOutcome::NotFound;
    };
    let items: Vec<MenuItem> = state
        .catalogs
        .skins_for_weapon(weapon_class)
        .map(|skin| {
            MenuItem::new(
                format!("{} ({})", skin.name, skin.paint),
                format!("{}|{}", skin.weapon_class, skin.paint),
            )
        })
        .collect();
    if items.is_empty() {
        return MenuOutcome::NotFound;
    }
    MenuOutcome::Menu(Menu {
        title: weapon.name.clone(),
        items,
    })
}

/// Routes a menu payload into the selection pipeline. A payload that does
/// not parse is treated the same as a catalog miss.
pub fn select(
    state: &AppState,
    player: &PlayerRef,
    category: Category,
    payload: &str,
) -> SelectOutcome {
    if !state.config.categories.enabled(category) {
        return SelectOutcome::NotFound;
    }
    match category {
        Category::Skins => {
            let Some((class, paint)) = payload.split_once('|') else {
                return SelectOutcome::NotFound;
            };
            let Ok(paint) = paint.parse() else {
                return SelectOutcome::NotFound;
            };
            state.pipeline.select_skin(player, class, paint)
        }
        Category::Knives => state.pipeline.select_knife(player, payload),
        Category::Gloves => match payload.parse() {
            Ok(defindex) => state.pipeline.select_glove(player, defindex),
            Err(_) => SelectOutcome::NotFound,
        },
        Category::Agents => state.pipeline.select_agent(player, payload),
        Category::Music => match payload.parse() {
            Ok(kit) => state.pipeline.select_music(player, kit),
            Err(_) => SelectOutcome::NotFound,
        },
        Category::Pins => match payload.parse() {
            Ok(pin) => state.pipeline.select_pin(player, pin),
            Err(_) => SelectOutcome::NotFound,
        },
    }
}

/// Hot-reload re-scan: wipe the store, then hydrate and re-dress every
/// connected player from durable state.
pub async fn reload(state: Arc<AppState>) {
    state.store.clear_all();
    state.previews.clear_all();
    for player in state.session.connected_players() {
        match state.sync.hydrate(&player, &state.store).await {
            Ok(_) => apply_all_visuals(&state, &player),
            Err(err) => warn!(slot = player.slot, %err, "reload hydration failed"),
        }
    }
}

pub fn apply_all_visuals(state: &AppState, player: &PlayerRef) {
    for category in [
        Category::Skins,
        Category::Knives,
        Category::Gloves,
        Category::Agents,
        Category::Music,
        Category::Pins,
    ] {
        if state.config.categories.enabled(category) {
            state.session.apply_visual(player, category);
        }
    }
}

fn weapon_menu(state: &AppState) -> Menu {
    Menu {
        title: "Weapons".to_owned(),
        items: state
            .catalogs
            .weapons()
            .filter(|weapon| weapon.class != "weapon_knife")
            .map(|weapon| MenuItem::new(weapon.name.clone(), weapon.class.clone()))
            .collect(),
    }
}

fn knife_menu(state: &AppState) -> Menu {
    Menu {
        title: "Knives".to_owned(),
        items: state
            .catalogs
            .knives()
            .map(|knife| MenuItem::new(knife.name.clone(), knife.class.clone()))
            .collect(),
    }
}

fn glove_menu(state: &AppState) -> Menu {
    let mut items = vec![MenuItem::new("Default", "0")];
    items.extend(
        state
            .catalogs
            .gloves()
            .map(|glove| MenuItem::new(glove.name.clone(), glove.defindex.to_string())),
    );
    Menu {
        title: "Gloves".to_owned(),
        items,
    }
}

fn music_menu(state: &AppState) -> Menu {
    let mut items = vec![MenuItem::new("None", "0")];
    items.extend(
        state
            .catalogs
            .music()
            .map(|kit| MenuItem::new(kit.name.clone(), kit.id.to_string())),
    );
    Menu {
        title: "Music Kits".to_owned(),
        items,
    }
}

fn pin_menu(state: &AppState) -> Menu {
    let mut items = vec![MenuItem::new("None", "0")];
    items.extend(
        state
            .catalogs
            .pins()
            .map(|pin| MenuItem::new(pin.name.clone(), pin.id.to_string())),
    );
    Menu {
        title: "Pins".to_owned(),
        items,
    }
}
