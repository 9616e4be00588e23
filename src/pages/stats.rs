use serde::Serialize;

use crate::model::robot::Robot;

/// Summary numbers for the dashboard tiles. Derived on every request; holds
/// no state of its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FleetStats {
    pub robots_total: usize,
    pub robots_online: usize,
    pub robots_offline: usize,
    pub avg_battery: f64,
}

impl FleetStats {
    pub fn from_robots(robots: &[Robot]) -> Self {
        let robots_total = robots.len();
        let robots_online = robots.iter().filter(|r| r.online).count();

        let avg_battery = if robots_total == 0 {
            0.0
        } else {
            let sum: u32 = robots.iter().map(|r| u32::from(r.battery)).sum();
            (sum as f64 / robots_total as f64 * 10.0).round() / 10.0
        };

        Self {
            robots_total,
            robots_online,
            robots_offline: robots_total - robots_online,
            avg_battery,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FleetStats;
    use crate::model::robot::Robot;

    fn robot(online: bool, battery: u8) -> Robot {
        Robot {
            id: uuid::Uuid::new_v4().to_string(),
            name: "test".into(),
            online,
            battery,
            created_ts: 0,
        }
    }

    #[test]
    fn counts_online_offline_and_average_battery() {
        let fleet = [robot(true, 80), robot(true, 60), robot(false, 40)];
        let stats = FleetStats::from_robots(&fleet);

        assert_eq!(stats.robots_total, 3);
        assert_eq!(stats.robots_online, 2);
        assert_eq!(stats.robots_offline, 1);
        assert_eq!(stats.avg_battery, 60.0);
    }

    #[test]
    fn empty_fleet_averages_to_zero() {
        let stats = FleetStats::from_robots(&[]);

        assert_eq!(stats.robots_total, 0);
        assert_eq!(stats.robots_online, 0);
        assert_eq!(stats.robots_offline, 0);
        assert_eq!(stats.avg_battery, 0.0);
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        let fleet = [robot(true, 50), robot(false, 51), robot(false, 51)];
        let stats = FleetStats::from_robots(&fleet);
        // 152 / 3 = 50.666... -> 50.7
        assert_eq!(stats.avg_battery, 50.7);
    }
}
