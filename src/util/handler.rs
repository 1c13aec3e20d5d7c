use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use tokio::signal;
use tracing::warn;

use crate::commands;
use crate::commands::{CommandOutcome, MenuOutcome};
use crate::loadout::select::SelectOutcome;
use crate::loadout::team::MatchTeam;
use crate::menu::Menu;
use crate::session::{Category, PlayerRef};
use crate::util::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConnectEvent {
    pub slot: i32,
    pub account_id: u64,
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub team: u8,
}

#[derive(Debug, Deserialize)]
pub struct SlotEvent {
    pub slot: i32,
}

#[derive(Debug, Deserialize)]
pub struct TeamEvent {
    pub slot: i32,
    pub team: u8,
}

#[derive(Debug, Deserialize)]
pub struct WeaponEvent {
    pub slot: i32,
    pub defindex: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub slot: i32,
    pub payload: String,
}

#[derive(Debug, Deserialize)]
pub struct MenuQuery {
    pub slot: i32,
    pub weapon: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Reply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
}

impl Reply {
    fn ok() -> Self {
        Self {
            ok: true,
            messages: Vec::new(),
        }
    }

    fn with_message(ok: bool, message: String) -> Self {
        Self {
            ok,
            messages: vec![message],
        }
    }

    fn silent() -> Self {
        Self {
            ok: false,
            messages: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PreviewReply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MenuReply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu: Option<Menu>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn throttle_message(remaining: std::time::Duration) -> String {
    let seconds = remaining.as_secs_f64().ceil() as u64;
    format!("Please wait {seconds} seconds before trying again.")
}

fn select_reply(outcome: SelectOutcome) -> Reply {
    match outcome {
        SelectOutcome::Applied { label } => Reply::with_message(true, format!("Selected {label}.")),
        SelectOutcome::Throttled { remaining } => {
            Reply::with_message(false, throttle_message(remaining))
        }
        SelectOutcome::NotFound => {
            Reply::with_message(false, "That item is no longer available.".to_owned())
        }
        SelectOutcome::SessionGone => Reply::silent(),
    }
}

fn command_reply(outcome: CommandOutcome) -> Reply {
    match outcome {
        CommandOutcome::Done { messages } => Reply { ok: true, messages },
        CommandOutcome::Throttled { remaining } => {
            Reply::with_message(false, throttle_message(remaining))
        }
        CommandOutcome::Disabled | CommandOutcome::SessionGone => Reply::silent(),
    }
}

/// Events arrive from the session host; the slot is resolved back to the
/// registered PlayerRef so stale slots fall out as silent no-ops.
fn resolve(app_state: &AppState, slot: i32) -> Option<PlayerRef> {
    app_state.session.player(slot)
}

pub async fn connect(
    State(app_state): State<Arc<AppState>>,
    Json(event): Json<ConnectEvent>,
) -> Json<Reply> {
    let player = PlayerRef {
        slot: event.slot,
        account_id: event.account_id,
        name: event.name,
        address: event.address,
    };
    app_state
        .session
        .connect(player.clone(), MatchTeam::from_team_num(event.team));

    // Hydration happens off the request path; visuals follow once it lands.
    tokio::spawn(async move {
        match app_state.sync.hydrate(&player, &app_state.store).await {
            Ok(_) => commands::apply_all_visuals(&app_state, &player),
            Err(err) => warn!(slot = player.slot, %err, "hydration on connect failed"),
        }
    });
    Json(Reply::ok())
}

pub async fn disconnect(
    State(app_state): State<Arc<AppState>>,
    Json(event): Json<SlotEvent>,
) -> Json<Reply> {
    app_state.session.disconnect(event.slot);
    app_state.store.clear_player(event.slot);
    app_state.cooldowns.clear(event.slot);
    Json(Reply::ok())
}

pub async fn team(
    State(app_state): State<Arc<AppState>>,
    Json(event): Json<TeamEvent>,
) -> Json<Reply> {
    app_state
        .session
        .set_team(event.slot, MatchTeam::from_team_num(event.team));
    Json(Reply::ok())
}

pub async fn weapon(
    State(app_state): State<Arc<AppState>>,
    Json(event): Json<WeaponEvent>,
) -> Json<Reply> {
    app_state.session.set_active_weapon(event.slot, event.defindex);
    Json(Reply::ok())
}

/// The host's menu renderer polls this while a preview entry is live.
pub async fn preview(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<SlotEvent>,
) -> Json<PreviewReply> {
    let image = app_state.previews.current(query.slot);
    Json(PreviewReply {
        ok: image.is_some(),
        image,
    })
}

pub async fn map_start(State(app_state): State<Arc<AppState>>) -> Json<Reply> {
    app_state.previews.clear_all();
    Json(Reply::ok())
}

pub async fn reload(State(app_state): State<Arc<AppState>>) -> Json<Reply> {
    tokio::spawn(commands::reload(app_state));
    Json(Reply::ok())
}

pub async fn command_refresh(
    State(app_state): State<Arc<AppState>>,
    Json(event): Json<SlotEvent>,
) -> Json<Reply> {
    let Some(player) = resolve(&app_state, event.slot) else {
        return Json(Reply::silent());
    };
    Json(command_reply(commands::refresh(&app_state, &player)))
}

pub async fn command_info(
    State(app_state): State<Arc<AppState>>,
    Json(event): Json<SlotEvent>,
) -> Json<Reply> {
    let Some(player) = resolve(&app_state, event.slot) else {
        return Json(Reply::silent());
    };
    Json(command_reply(commands::info(&app_state, &player)))
}

pub async fn command_stattrak(
    State(app_state): State<Arc<AppState>>,
    Json(event): Json<SlotEvent>,
) -> Json<Reply> {
    let Some(player) = resolve(&app_state, event.slot) else {
        return Json(Reply::silent());
    };
    Json(select_reply(commands::stattrak(&app_state, &player)))
}

pub async fn menu(
    State(app_state): State<Arc<AppState>>,
    Path(category): Path<String>,
    Query(query): Query<MenuQuery>,
) -> Json<MenuReply> {
    let not_found = || MenuReply {
        ok: false,
        menu: None,
        message: Some("That menu is not available.".to_owned()),
    };
    let Some(category) = Category::parse(&category) else {
        return Json(not_found());
    };
    let Some(player) = resolve(&app_state, query.slot) else {
        return Json(MenuReply {
            ok: false,
            menu: None,
            message: None,
        });
    };

    let outcome = match (category, query.weapon.as_deref()) {
        (Category::Skins, Some(weapon_class)) => {
            commands::skins_for_weapon_menu(&app_state, &player, weapon_class)
        }
        _ => commands::open_menu(&app_state, &player, category),
    };
    Json(match outcome {
        MenuOutcome::Menu(menu) => MenuReply {
            ok: true,
            menu: Some(menu),
            message: None,
        },
        MenuOutcome::Throttled { remaining } => MenuReply {
            ok: false,
            menu: None,
            message: Some(throttle_message(remaining)),
        },
        MenuOutcome::Disabled | MenuOutcome::NotFound => not_found(),
        MenuOutcome::SessionGone => MenuReply {
            ok: false,
            menu: None,
            message: None,
        },
    })
}

pub async fn select(
    State(app_state): State<Arc<AppState>>,
    Path(category): Path<String>,
    Json(request): Json<SelectRequest>,
) -> Json<Reply> {
    let Some(category) = Category::parse(&category) else {
        return Json(Reply::with_message(
            false,
            "That item is no longer available.".to_owned(),
        ));
    };
    let Some(player) = resolve(&app_state, request.slot) else {
        return Json(Reply::silent());
    };
    Json(select_reply(commands::select(
        &app_state,
        &player,
        category,
        &request.payload,
    )))
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
