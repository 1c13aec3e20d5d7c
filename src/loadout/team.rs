/// One of the two playable match factions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Terrorist,
    CounterTerrorist,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Terrorist, Side::CounterTerrorist];

    /// Engine team number as stored durably (2 = T, 3 = CT).
    pub fn team_num(self) -> u8 {
        match self {
            Side::Terrorist => 2,
            Side::CounterTerrorist => 3,
        }
    }

    pub fn from_team_num(num: u8) -> Option<Side> {
        match num {
            2 => Some(Side::Terrorist),
            3 => Some(Side::CounterTerrorist),
            _ => None,
        }
    }
}

/// A player's current team assignment as reported by the session host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTeam {
    Unassigned,
    Spectator,
    Playing(Side),
}

impl MatchTeam {
    pub fn from_team_num(num: u8) -> MatchTeam {
        match Side::from_team_num(num) {
            Some(side) => MatchTeam::Playing(side),
            None if num == 1 => MatchTeam::Spectator,
            None => MatchTeam::Unassigned,
        }
    }
}

/// The side slot(s) a selection event writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamTargets {
    Both,
    One(Side),
}

impl TeamTargets {
    pub fn sides(self) -> impl Iterator<Item = Side> {
        let sides: &'static [Side] = match self {
            TeamTargets::Both => &Side::BOTH,
            TeamTargets::One(Side::Terrorist) => &[Side::Terrorist],
            TeamTargets::One(Side::CounterTerrorist) => &[Side::CounterTerrorist],
        };
        sides.iter().copied()
    }

}

/// Players without a fixed side get their picks broadcast to both sides, so
/// a later side assignment needs no backfill.
pub fn resolve_targets(team: MatchTeam) -> TeamTargets {
    match team {
        MatchTeam::Playing(side) => TeamTargets::One(side),
        MatchTeam::Unassigned | MatchTeam::Spectator => TeamTargets::Both,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigned_player_targets_own_side() {
        let targets = resolve_targets(MatchTeam::Playing(Side::CounterTerrorist));
        assert_eq!(targets, TeamTargets::One(Side::CounterTerrorist));
        assert_eq!(targets.sides().collect::<Vec<_>>(), vec![Side::CounterTerrorist]);
    }

    #[test]
    fn unassigned_and_spectator_broadcast_to_both() {
        for team in [MatchTeam::Unassigned, MatchTeam::Spectator] {
            let targets = resolve_targets(team);
            assert_eq!(targets, TeamTargets::Both);
            assert_eq!(
                targets.sides().collect::<Vec<_>>(),
                vec![Side::Terrorist, Side::CounterTerrorist]
            );
        }
    }

    #[test]
    fn team_numbers_round_trip() {
        for side in Side::BOTH {
            assert_eq!(Side::from_team_num(side.team_num()), Some(side));
        }
        assert_eq!(Side::from_team_num(0), None);
        assert_eq!(MatchTeam::from_team_num(1), MatchTeam::Spectator);
        assert_eq!(MatchTeam::from_team_num(0), MatchTeam::Unassigned);
    }
}
