use log::info;
use shared::{
    GameView, LastOutcome, Phase, BALLS_PER_INNINGS, DEFAULT_NAMES, MAX_NAME_LEN, PICK_OPTIONS,
    RUN_VALUES, SEATS, WICKETS_PER_INNINGS,
};

/// The single authoritative match record. Mutated only from the server's
/// coordinating loop, so every operation runs to completion before the
/// next inbound event is looked at.
#[derive(Debug, Clone)]
pub struct Game {
    seats: [Option<u32>; SEATS],
    names: [String; SEATS],
    innings: u8,
    batting_seat: usize,
    runs: [u32; SEATS],
    wickets_lost: [u32; SEATS],
    balls_bowled: u32,
    target: Option<u32>,
    pending_picks: [Option<u8>; SEATS],
    phase: Phase,
    last_outcome: Option<LastOutcome>,
}

impl Game {
    pub fn new() -> Self {
        Self {
            seats: [None; SEATS],
            names: [DEFAULT_NAMES[0].to_string(), DEFAULT_NAMES[1].to_string()],
            innings: 1,
            batting_seat: 0,
            runs: [0; SEATS],
            wickets_lost: [0; SEATS],
            balls_bowled: 0,
            target: None,
            pending_picks: [None; SEATS],
            phase: Phase::Waiting,
            last_outcome: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The seat a session holds, if any. Sessions without a seat are
    /// observers.
    pub fn seat_of(&self, session: u32) -> Option<usize> {
        self.seats.iter().position(|slot| *slot == Some(session))
    }

    /// Binds the session to the first free seat. Returns the seat, or
    /// None when both are taken. Filling the second seat starts play.
    pub fn occupy_seat(&mut self, session: u32) -> Option<usize> {
        let seat = self.seats.iter().position(|slot| slot.is_none())?;
        self.seats[seat] = Some(session);
        info!("Session {} takes seat {}", session, seat);

        if self.phase == Phase::Waiting && self.seats.iter().all(|slot| slot.is_some()) {
            self.phase = Phase::Picking;
            info!("Both seats occupied, play begins");
        }
        Some(seat)
    }

    /// Frees the seat held by a disconnecting session. A match that is
    /// not already over stalls in `waiting` rather than continuing with
    /// a missing player; scores survive so a rejoining device resumes.
    pub fn release_seat(&mut self, session: u32) -> bool {
        let Some(seat) = self.seat_of(session) else {
            return false;
        };
        self.seats[seat] = None;
        info!("Seat {} released by session {}", seat, session);

        if self.phase != Phase::GameOver {
            self.pending_picks = [None; SEATS];
            self.phase = Phase::Waiting;
        }
        true
    }

    /// Sets a seat's display name, truncated to the 20-character cap.
    /// An empty result is ignored.
    pub fn rename(&mut self, seat: usize, name: &str) -> bool {
        let name: String = name.chars().take(MAX_NAME_LEN).collect();
        if name.is_empty() {
            return false;
        }
        self.names[seat] = name;
        true
    }

    /// Locks in a pick for one seat. Accepted only mid-`picking`, only
    /// once per seat per ball, only for indices 0-5. The second seat's
    /// pick resolves the ball immediately.
    pub fn submit_pick(&mut self, seat: usize, pick: u8) -> bool {
        if self.phase != Phase::Picking
            || pick >= PICK_OPTIONS
            || self.pending_picks[seat].is_some()
        {
            return false;
        }
        self.pending_picks[seat] = Some(pick);

        if self.pending_picks.iter().all(|pending| pending.is_some()) {
            self.resolve_ball();
        }
        true
    }

    fn resolve_ball(&mut self) {
        let batting = self.batting_seat;
        let bowling = 1 - batting;
        let (Some(batting_pick), Some(bowling_pick)) =
            (self.pending_picks[batting], self.pending_picks[bowling])
        else {
            return;
        };
        self.pending_picks = [None; SEATS];
        self.balls_bowled += 1;

        let wicket = batting_pick == bowling_pick;
        let runs = if wicket {
            self.wickets_lost[batting] += 1;
            0
        } else {
            let scored = RUN_VALUES[batting_pick as usize];
            self.runs[batting] += scored;
            scored
        };
        self.last_outcome = Some(LastOutcome {
            wicket,
            runs,
            batting_pick,
            bowling_pick,
        });
        info!(
            "Ball {} of innings {}: bat {} vs bowl {} -> {}",
            self.balls_bowled,
            self.innings,
            batting_pick,
            bowling_pick,
            if wicket { "wicket".to_string() } else { format!("{} runs", runs) },
        );

        // A completed chase ends the match on the spot, skipping the
        // usual next-ball signal.
        if self.innings == 2 && self.target.map_or(false, |target| self.runs[batting] > target) {
            self.phase = Phase::GameOver;
            info!("Target passed, match over");
            return;
        }
        self.phase = Phase::Result;
    }

    fn innings_over(&self) -> bool {
        self.balls_bowled >= BALLS_PER_INNINGS
            || self.wickets_lost[self.batting_seat] >= WICKETS_PER_INNINGS
    }

    /// Advances out of the `result` pause: same innings if it is still
    /// live, the innings break after innings 1, or the end of the match
    /// after innings 2.
    pub fn next_ball(&mut self) -> bool {
        if self.phase != Phase::Result {
            return false;
        }
        self.pending_picks = [None; SEATS];

        if !self.innings_over() {
            self.phase = Phase::Picking;
        } else if self.innings == 1 {
            let target = self.runs[self.batting_seat];
            self.target = Some(target);
            self.batting_seat = 1 - self.batting_seat;
            self.balls_bowled = 0;
            self.innings = 2;
            self.phase = Phase::Picking;
            info!("Innings break: seat {} chases {}", self.batting_seat, target + 1);
        } else {
            self.phase = Phase::GameOver;
            info!("Innings 2 complete, match over");
        }
        true
    }

    /// Rebuilds the match from scratch while keeping seat bindings and
    /// names. Resumes play directly when both seats are still filled.
    pub fn restart(&mut self) {
        let seats = self.seats;
        let names = self.names.clone();
        *self = Game::new();
        self.seats = seats;
        self.names = names;

        if self.seats.iter().all(|slot| slot.is_some()) {
            self.phase = Phase::Picking;
        }
        info!("Game restarted");
    }

    /// Projects the state for one viewer. Only the viewer's own pending
    /// pick is reflected, and only as a boolean.
    pub fn view_for(&self, seat: Option<usize>) -> GameView {
        GameView {
            phase: self.phase,
            innings: self.innings,
            batting_seat: self.batting_seat,
            runs: self.runs,
            wickets_lost: self.wickets_lost,
            balls_bowled: self.balls_bowled,
            target: self.target,
            names: self.names.clone(),
            last_outcome: self.last_outcome,
            my_pick_locked: seat.map_or(false, |s| self.pending_picks[s].is_some()),
            seats_occupied: [self.seats[0].is_some(), self.seats[1].is_some()],
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
