//! Hall-wide settings.

use std::str::FromStr;
use std::time::Duration;

use bingohall_room::RoomConfig;
use bingohall_session::SessionConfig;
use bingohall_store::StoreConfig;
use bingohall_sweep::SweepConfig;

use crate::BingoHallError;

/// Configuration for every layer of a hall.
#[derive(Debug, Clone, Default)]
pub struct HallSettings {
    pub store: StoreConfig,
    pub room: RoomConfig,
    pub sweep: SweepConfig,
    pub session: SessionConfig,
}

impl HallSettings {
    /// Defaults overlaid with whichever of these environment variables are
    /// set:
    ///
    /// | Variable               | Field                           |
    /// |------------------------|---------------------------------|
    /// | `MIN_PLAYERS_TO_START` | `room.min_players_to_start`     |
    /// | `COUNTDOWN_SECS`       | `room.countdown`                |
    /// | `CARD_POOL_SIZE`       | `room.card_pool_size`           |
    /// | `DEFAULT_MAX_PLAYERS`  | `room.default_max_players`      |
    /// | `LOCK_TIMEOUT_MS`      | `store.lock_timeout`            |
    /// | `SWEEP_INTERVAL_SECS`  | `sweep.interval`                |
    /// | `INTERACTION_TTL_SECS` | `session.interaction_ttl`       |
    ///
    /// # Errors
    /// [`BingoHallError::Config`] if a set variable doesn't parse.
    pub fn from_env() -> Result<Self, BingoHallError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through
    /// `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BingoHallError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        let room = &mut settings.room;

        if let Some(n) = parse(&lookup, "MIN_PLAYERS_TO_START")? {
            room.min_players_to_start = n;
        }
        if let Some(secs) = parse(&lookup, "COUNTDOWN_SECS")? {
            room.countdown = Duration::from_secs(secs);
        }
        if let Some(n) = parse(&lookup, "CARD_POOL_SIZE")? {
            room.card_pool_size = n;
        }
        if let Some(n) = parse(&lookup, "DEFAULT_MAX_PLAYERS")? {
            room.default_max_players = n;
        }
        if let Some(ms) = parse(&lookup, "LOCK_TIMEOUT_MS")? {
            settings.store.lock_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = parse(&lookup, "SWEEP_INTERVAL_SECS")? {
            settings.sweep.interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse(&lookup, "INTERACTION_TTL_SECS")? {
            settings.session.interaction_ttl = Duration::from_secs(secs);
        }
        Ok(settings)
    }
}

fn parse<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, BingoHallError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| BingoHallError::Config { var, value: raw })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_from_lookup_empty_gives_defaults() {
        let settings = HallSettings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.room.min_players_to_start, 2);
        assert_eq!(settings.room.countdown, Duration::from_secs(60));
        assert_eq!(settings.store.lock_timeout, Duration::from_secs(5));
        assert_eq!(settings.sweep.interval, Duration::from_secs(10));
        assert_eq!(settings.session.interaction_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_from_lookup_overrides_each_field() {
        let settings = HallSettings::from_lookup(lookup(&[
            ("MIN_PLAYERS_TO_START", "1"),
            ("COUNTDOWN_SECS", "30"),
            ("CARD_POOL_SIZE", "20"),
            ("DEFAULT_MAX_PLAYERS", " 8 "),
            ("LOCK_TIMEOUT_MS", "250"),
            ("SWEEP_INTERVAL_SECS", "3"),
            ("INTERACTION_TTL_SECS", "45"),
        ]))
        .unwrap();
        assert_eq!(settings.room.min_players_to_start, 1);
        assert_eq!(settings.room.countdown, Duration::from_secs(30));
        assert_eq!(settings.room.card_pool_size, 20);
        assert_eq!(settings.room.default_max_players, 8);
        assert_eq!(settings.store.lock_timeout, Duration::from_millis(250));
        assert_eq!(settings.sweep.interval, Duration::from_secs(3));
        assert_eq!(settings.session.interaction_ttl, Duration::from_secs(45));
    }

    #[test]
    fn test_from_lookup_unparsable_value_is_config_error() {
        let err = HallSettings::from_lookup(lookup(&[("COUNTDOWN_SECS", "soon")])).unwrap_err();
        assert!(matches!(
            err,
            BingoHallError::Config { var: "COUNTDOWN_SECS", .. }
        ));
    }
}
