use crate::services::lookup::{EntityKind, EntityRef, LookupPayload};

/// Monotonic stamp of the lookup a result belongs to. Anything carrying an
/// older epoch than the current one is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ResultEpoch(pub u64);

#[derive(Debug, Clone)]
pub struct CurrentResult {
    pub epoch: ResultEpoch,
    pub payload: LookupPayload,
}

/// Strict mode delta. This is the ONLY way the mode record mutates.
#[derive(Debug, Clone)]
pub enum ModeDelta {
    Muted(bool),
    UserInteracted,
    /// A new lookup supersedes everything in flight.
    LookupStarted,
    ResultArrived(LookupPayload),
    Narrated(ResultEpoch),
}

/// Coordinator-owned flags that outlive a single speech session.
#[derive(Debug, Clone, Default)]
pub struct ModeRecord {
    tts_muted: bool,
    user_interacted: bool,
    epoch: ResultEpoch,
    current: Option<CurrentResult>,
    last_player: Option<EntityRef>,
    last_club: Option<EntityRef>,
    narrated: Option<ResultEpoch>,
    /// Bumped on every reduction.
    pub version: u64,
}

impl ModeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reduce(&mut self, delta: ModeDelta) {
        self.version += 1;

        match delta {
            ModeDelta::Muted(muted) => self.tts_muted = muted,
            ModeDelta::UserInteracted => self.user_interacted = true,
            ModeDelta::LookupStarted => {
                self.epoch = ResultEpoch(self.epoch.0 + 1);
                // Starting a search counts as interaction and lifts a prior mute.
                self.tts_muted = false;
                self.user_interacted = true;
            }
            ModeDelta::ResultArrived(payload) => {
                match &payload {
                    LookupPayload::Player(p) | LookupPayload::Comparison(p, _) => {
                        self.last_player = Some(p.entity.clone());
                    }
                    LookupPayload::Club(c) => self.last_club = Some(c.entity.clone()),
                }
                self.current = Some(CurrentResult {
                    epoch: self.epoch,
                    payload,
                });
            }
            ModeDelta::Narrated(epoch) => self.narrated = Some(epoch),
        }
    }

    pub fn is_muted(&self) -> bool {
        self.tts_muted
    }

    pub fn user_interacted(&self) -> bool {
        self.user_interacted
    }

    pub fn epoch(&self) -> ResultEpoch {
        self.epoch
    }

    pub fn current(&self) -> Option<&CurrentResult> {
        self.current.as_ref()
    }

    pub fn was_narrated(&self, epoch: ResultEpoch) -> bool {
        self.narrated == Some(epoch)
    }

    /// Resolves the "this" sentinel.
    pub fn last_entity(&self, kind: EntityKind) -> Option<&EntityRef> {
        match kind {
            EntityKind::Player => self.last_player.as_ref(),
            EntityKind::Club => self.last_club.as_ref(),
        }
    }
}
