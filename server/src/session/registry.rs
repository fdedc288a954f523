//! Registry of components seen on the link

use mavlink::ardupilotmega::{MavAutopilot, MavType, HEARTBEAT_DATA};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// (system id, component id)
pub type ComponentKey = (u8, u8);

/// What we know about one component
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    pub mav_type: MavType,
    pub autopilot: MavAutopilot,
    pub first_seen: Instant,
    pub last_heartbeat: Instant,
    pub heartbeats: u64,
}

/// Tracks every component that has sent a heartbeat
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    components: HashMap<ComponentKey, ComponentInfo>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a heartbeat. Returns true on the first sighting.
    pub fn observe(&mut self, key: ComponentKey, hb: &HEARTBEAT_DATA, now: Instant) -> bool {
        match self.components.get_mut(&key) {
            Some(info) => {
                info.mav_type = hb.mavtype;
                info.autopilot = hb.autopilot;
                info.last_heartbeat = now;
                info.heartbeats += 1;
                false
            }
            None => {
                self.components.insert(
                    key,
                    ComponentInfo {
                        mav_type: hb.mavtype,
                        autopilot: hb.autopilot,
                        first_seen: now,
                        last_heartbeat: now,
                        heartbeats: 1,
                    },
                );
                true
            }
        }
    }

    pub fn get(&self, key: ComponentKey) -> Option<&ComponentInfo> {
        self.components.get(&key)
    }

    /// Drop components whose last heartbeat is older than `timeout`
    pub fn remove_stale(&mut self, now: Instant, timeout: Duration) -> Vec<(ComponentKey, ComponentInfo)> {
        let stale: Vec<ComponentKey> = self
            .components
            .iter()
            .filter(|(_, info)| now.saturating_duration_since(info.last_heartbeat) > timeout)
            .map(|(key, _)| *key)
            .collect();

        stale
            .into_iter()
            .filter_map(|key| self.components.remove(&key).map(|info| (key, info)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heartbeat(mav_type: MavType) -> HEARTBEAT_DATA {
        HEARTBEAT_DATA {
            mavtype: mav_type,
            autopilot: MavAutopilot::MAV_AUTOPILOT_INVALID,
            ..Default::default()
        }
    }

    #[test]
    fn test_first_sighting_only_once() {
        let mut registry = ComponentRegistry::new();
        let now = Instant::now();
        let hb = heartbeat(MavType::MAV_TYPE_CAMERA);

        assert!(registry.observe((1, 100), &hb, now));
        assert!(!registry.observe((1, 100), &hb, now));
        assert!(registry.observe((1, 1), &heartbeat(MavType::MAV_TYPE_GENERIC), now));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get((1, 100)).unwrap().heartbeats, 2);
        assert_eq!(registry.get((1, 100)).unwrap().mav_type, MavType::MAV_TYPE_CAMERA);
    }

    #[test]
    fn test_remove_stale() {
        let mut registry = ComponentRegistry::new();
        let start = Instant::now();
        let hb = heartbeat(MavType::MAV_TYPE_GENERIC);

        registry.observe((1, 1), &hb, start);
        registry.observe((1, 100), &hb, start);
        registry.observe((1, 100), &hb, start + Duration::from_secs(4));

        let lost = registry.remove_stale(start + Duration::from_secs(6), Duration::from_secs(5));
        assert_eq!(lost.len(), 1);
        assert_eq!(lost[0].0, (1, 1));
        assert_eq!(registry.len(), 1);
        assert!(registry.get((1, 100)).is_some());
    }
}
