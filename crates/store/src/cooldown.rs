use std::{sync::Arc, time::Duration};

use serde_json::json;

use crate::{backend::StoreBackend, directory::Directory, error::Result, shared::keys};

/// A named category of rate-limited action, scoped per actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CooldownClass {
    /// Publishing a server promotion.
    Publish,
    /// Running a tag search.
    Search,
}

impl CooldownClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Search => "search",
        }
    }

    fn store_key(&self) -> &'static str {
        match self {
            Self::Publish => keys::USER_COOLDOWNS,
            Self::Search => keys::SEARCH_COOLDOWNS,
        }
    }
}

impl std::fmt::Display for CooldownClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a cooldown check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    /// Remaining wait, rounded up to whole minutes for user-facing messages.
    Blocked { remaining_minutes: u64 },
}

/// Per-actor cooldown windows, one persisted table per class.
///
/// The gate only reads: a caller that gets [`Decision::Allowed`] records the
/// timestamp with [`CooldownGate::commit`] once the gated action actually
/// proceeds (check-then-commit, not an atomic read-modify-write). Two
/// near-simultaneous invocations by the same actor can therefore both pass
/// the check before either commits; callers that need exact-once-per-window
/// semantics must serialise per (actor, class) themselves.
///
/// Records are never evicted; each table grows with the number of distinct
/// actors seen.
pub struct CooldownGate {
    publish: Directory,
    search: Directory,
}

impl CooldownGate {
    /// Load both cooldown tables from the backend.
    pub fn load(backend: &Arc<dyn StoreBackend>) -> Result<Self> {
        Ok(Self {
            publish: Directory::load(CooldownClass::Publish.store_key(), Arc::clone(backend))?,
            search: Directory::load(CooldownClass::Search.store_key(), Arc::clone(backend))?,
        })
    }

    fn table(&self, class: CooldownClass) -> &Directory {
        match class {
            CooldownClass::Publish => &self.publish,
            CooldownClass::Search => &self.search,
        }
    }

    /// Query whether `actor` may perform a `class` action at `now_millis`.
    ///
    /// Allowed when no record exists or the window has fully elapsed. The
    /// blocked remainder is `ceil(remaining_millis / 60_000)` minutes.
    pub fn check(
        &self,
        actor: &str,
        class: CooldownClass,
        window: Duration,
        now_millis: i64,
    ) -> Decision {
        let Some(last) = self.table(class).get(actor).and_then(|v| v.as_i64()) else {
            return Decision::Allowed;
        };
        let window_millis = window.as_millis() as i64;
        let elapsed = now_millis.saturating_sub(last);
        if elapsed >= window_millis {
            Decision::Allowed
        } else {
            let remaining = window_millis - elapsed;
            Decision::Blocked {
                remaining_minutes: (remaining as u64).div_ceil(60_000),
            }
        }
    }

    /// Record that `actor` performed a `class` action at `now_millis` and
    /// flush the table. Call only after the gated action proceeded.
    pub fn commit(&self, actor: &str, class: CooldownClass, now_millis: i64) -> Result<()> {
        self.table(class).insert(actor, json!(now_millis))
    }

    /// Number of distinct actors recorded for a class.
    pub fn recorded(&self, class: CooldownClass) -> usize {
        self.table(class).len()
    }
}

/// Current wall-clock time as epoch milliseconds.
pub fn unix_now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, crate::backend::MemoryBackend, rstest::rstest};

    const HOUR: Duration = Duration::from_secs(3600);

    fn gate() -> CooldownGate {
        let backend: Arc<dyn StoreBackend> = MemoryBackend::new();
        CooldownGate::load(&backend).unwrap()
    }

    #[test]
    fn unknown_actor_is_allowed() {
        let gate = gate();
        assert_eq!(
            gate.check("42", CooldownClass::Publish, HOUR, 1_000_000),
            Decision::Allowed
        );
    }

    #[test]
    fn committed_actor_is_blocked_within_window() {
        let gate = gate();
        let t0 = 1_000_000;
        gate.commit("42", CooldownClass::Publish, t0).unwrap();

        // One millisecond in: the full hour remains, rounded up to 60 minutes.
        assert_eq!(
            gate.check("42", CooldownClass::Publish, HOUR, t0 + 1),
            Decision::Blocked {
                remaining_minutes: 60
            }
        );
    }

    #[rstest]
    // elapsed 30 min → 30 min remain
    #[case(30 * 60_000, 30)]
    // elapsed 59 min 1 ms into the window → 1 minute remains (rounded up)
    #[case(59 * 60_000 + 1, 1)]
    // elapsed 1 ms short of a full minute boundary → rounds up
    #[case(30 * 60_000 - 1, 31)]
    fn remaining_minutes_round_up(#[case] elapsed: i64, #[case] expected: u64) {
        let gate = gate();
        let t0 = 5_000_000;
        gate.commit("42", CooldownClass::Publish, t0).unwrap();

        assert_eq!(
            gate.check("42", CooldownClass::Publish, HOUR, t0 + elapsed),
            Decision::Blocked {
                remaining_minutes: expected
            }
        );
    }

    #[test]
    fn allowed_once_window_elapses() {
        let gate = gate();
        let t0 = 1_000_000;
        gate.commit("42", CooldownClass::Publish, t0).unwrap();

        let window_millis = HOUR.as_millis() as i64;
        assert_eq!(
            gate.check("42", CooldownClass::Publish, HOUR, t0 + window_millis),
            Decision::Allowed
        );
        assert_eq!(
            gate.check("42", CooldownClass::Publish, HOUR, t0 + window_millis - 1),
            Decision::Blocked {
                remaining_minutes: 1
            }
        );
    }

    #[test]
    fn classes_are_independent() {
        let gate = gate();
        let t0 = 1_000_000;
        gate.commit("42", CooldownClass::Publish, t0).unwrap();

        assert_eq!(
            gate.check("42", CooldownClass::Search, HOUR, t0 + 1),
            Decision::Allowed
        );
    }

    #[test]
    fn commit_persists_to_the_class_store() {
        let backend = MemoryBackend::new();
        let gate = {
            let b: Arc<dyn StoreBackend> = Arc::clone(&backend) as Arc<dyn StoreBackend>;
            CooldownGate::load(&b).unwrap()
        };
        gate.commit("42", CooldownClass::Search, 7).unwrap();

        let saved = backend.saved(keys::SEARCH_COOLDOWNS).unwrap();
        assert_eq!(saved.get("42").and_then(|v| v.as_i64()), Some(7));
        assert!(backend.saved(keys::USER_COOLDOWNS).is_none());
    }

    #[test]
    fn records_grow_and_are_never_evicted() {
        let gate = gate();
        for actor in 0..10 {
            gate.commit(&actor.to_string(), CooldownClass::Publish, 1)
                .unwrap();
        }
        assert_eq!(gate.recorded(CooldownClass::Publish), 10);
    }
}
