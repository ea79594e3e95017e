use serde::{Deserialize, Serialize};

pub const SEATS: usize = 2;
pub const BALLS_PER_INNINGS: u32 = 30;
pub const WICKETS_PER_INNINGS: u32 = 10;
pub const PICK_OPTIONS: u8 = 6;
pub const MAX_NAME_LEN: usize = 20;
pub const DEFAULT_NAMES: [&str; SEATS] = ["Player 1", "Player 2"];

/// Runs scored for each batting pick index. Picking higher runs means
/// guessing from the same six-option space the bowler does, so bigger
/// shots carry the same dismissal odds as small ones.
pub const RUN_VALUES: [u32; PICK_OPTIONS as usize] = [1, 2, 3, 4, 5, 6];

/// Messages a connected browser may send. Unknown or malformed `kind`
/// tags fail to deserialize and are dropped at the boundary.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ClientMsg {
    Rename { name: String },
    Pick { pick: u8 },
    NextBall,
    Restart,
}

/// Messages the server sends. Each is personalized per connection: `seat`
/// is the receiver's own seat, or -1 for observers.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ServerMsg {
    Joined { seat: i32 },
    State { seat: i32, game: GameView },
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Waiting,
    Picking,
    Result,
    GameOver,
}

/// The most recently resolved ball.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LastOutcome {
    pub wicket: bool,
    pub runs: u32,
    pub batting_pick: u8,
    pub bowling_pick: u8,
}

/// One observer's projection of the shared game state. `my_pick_locked`
/// says only whether the receiver has locked in a pick for the current
/// ball; the opponent's in-flight pick value is never included.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub phase: Phase,
    pub innings: u8,
    pub batting_seat: usize,
    pub runs: [u32; SEATS],
    pub wickets_lost: [u32; SEATS],
    pub balls_bowled: u32,
    pub target: Option<u32>,
    pub names: [String; SEATS],
    pub last_outcome: Option<LastOutcome>,
    pub my_pick_locked: bool,
    pub seats_occupied: [bool; SEATS],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_msg_kinds_deserialize() {
        let rename: ClientMsg = serde_json::from_str(r#"{"kind":"rename","name":"Asha"}"#).unwrap();
        assert_eq!(
            rename,
            ClientMsg::Rename {
                name: "Asha".to_string()
            }
        );

        let pick: ClientMsg = serde_json::from_str(r#"{"kind":"pick","pick":3}"#).unwrap();
        assert_eq!(pick, ClientMsg::Pick { pick: 3 });

        let next: ClientMsg = serde_json::from_str(r#"{"kind":"next-ball"}"#).unwrap();
        assert_eq!(next, ClientMsg::NextBall);

        let restart: ClientMsg = serde_json::from_str(r#"{"kind":"restart"}"#).unwrap();
        assert_eq!(restart, ClientMsg::Restart);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(serde_json::from_str::<ClientMsg>(r#"{"kind":"forfeit"}"#).is_err());
        assert!(serde_json::from_str::<ClientMsg>(r#"{"pick":3}"#).is_err());
        assert!(serde_json::from_str::<ClientMsg>(r#"{"kind":"pick","pick":"3"}"#).is_err());
    }

    #[test]
    fn joined_message_shape() {
        let json = serde_json::to_string(&ServerMsg::Joined { seat: -1 }).unwrap();
        assert_eq!(json, r#"{"kind":"joined","seat":-1}"#);
    }

    #[test]
    fn phase_names_are_lowercase() {
        assert_eq!(serde_json::to_string(&Phase::Waiting).unwrap(), r#""waiting""#);
        assert_eq!(serde_json::to_string(&Phase::GameOver).unwrap(), r#""gameover""#);
    }

    #[test]
    fn state_view_uses_camel_case_fields() {
        let view = GameView {
            phase: Phase::Picking,
            innings: 2,
            batting_seat: 1,
            runs: [45, 12],
            wickets_lost: [3, 0],
            balls_bowled: 4,
            target: Some(45),
            names: ["Asha".to_string(), "Ravi".to_string()],
            last_outcome: Some(LastOutcome {
                wicket: false,
                runs: 4,
                batting_pick: 3,
                bowling_pick: 0,
            }),
            my_pick_locked: true,
            seats_occupied: [true, true],
        };
        let json = serde_json::to_string(&ServerMsg::State { seat: 1, game: view }).unwrap();

        assert!(json.contains(r#""kind":"state""#));
        assert!(json.contains(r#""battingSeat":1"#));
        assert!(json.contains(r#""wicketsLost":[3,0]"#));
        assert!(json.contains(r#""ballsBowled":4"#));
        assert!(json.contains(r#""target":45"#));
        assert!(json.contains(r#""myPickLocked":true"#));
        assert!(json.contains(r#""seatsOccupied":[true,true]"#));
        assert!(json.contains(r#""battingPick":3"#));
    }

    #[test]
    fn run_table_covers_every_pick() {
        for pick in 0..PICK_OPTIONS {
            assert_eq!(RUN_VALUES[pick as usize], pick as u32 + 1);
        }
    }
}
