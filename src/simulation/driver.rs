use serde::Deserialize;

use super::Simulation;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub tick_interval_secs: f32,
    /// Upper bound on ticks run for one frame, so a stalled frame does not
    /// trigger a burst of catch-up work.
    pub max_ticks_per_advance: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 1.0 / 60.0,
            max_ticks_per_advance: 4,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub ticks: usize,
    /// The simulation settled during this advance and the driver suspended it.
    pub settled: bool,
}

/// Fixed-interval tick driver fed with frame time by the host.
#[derive(Clone, Debug)]
pub struct TickDriver {
    config: DriverConfig,
    accumulator: f32,
}

impl TickDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            accumulator: 0.0,
        }
    }

    pub fn config(&self) -> DriverConfig {
        self.config
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    /// Runs every whole tick that fits in the accumulated time, calling
    /// `on_tick` after each one.
    pub fn advance(
        &mut self,
        simulation: &mut Simulation,
        delta_seconds: f32,
        mut on_tick: impl FnMut(&Simulation),
    ) -> TickReport {
        let mut report = TickReport::default();
        if !simulation.is_active() {
            self.accumulator = 0.0;
            return report;
        }

        let interval = self.config.tick_interval_secs.max(1e-4);
        let max_ticks = self.config.max_ticks_per_advance.max(1);
        self.accumulator = (self.accumulator + delta_seconds.max(0.0)).min(interval * max_ticks as f32);

        while self.accumulator >= interval && report.ticks < max_ticks {
            self.accumulator -= interval;
            simulation.tick();
            report.ticks += 1;
            on_tick(simulation);

            if simulation.is_settled() {
                simulation.suspend();
                self.accumulator = 0.0;
                report.settled = true;
                break;
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{Vec2, vec2};

    use super::*;
    use crate::simulation::{GraphNode, SimulationParams};

    fn simulation() -> Simulation {
        let nodes = vec![
            GraphNode::new("a".into(), Vec2::ZERO, 5.0),
            GraphNode::new("b".into(), vec2(10.0, 0.0), 5.0),
        ];
        Simulation::new(nodes, Vec::new(), Vec::new(), SimulationParams::default()).unwrap()
    }

    #[test]
    fn runs_whole_ticks_only() {
        let mut driver = TickDriver::new(DriverConfig::default());
        let mut simulation = simulation();
        let mut observed = 0;

        let report = driver.advance(&mut simulation, 1.0 / 120.0, |_| observed += 1);
        assert_eq!(report.ticks, 0);

        let report = driver.advance(&mut simulation, 1.0 / 100.0, |_| observed += 1);
        assert_eq!(report.ticks, 1);
        assert_eq!(observed, 1);
    }

    #[test]
    fn caps_catch_up_work() {
        let mut driver = TickDriver::new(DriverConfig::default());
        let mut simulation = simulation();

        let report = driver.advance(&mut simulation, 5.0, |_| {});
        assert_eq!(report.ticks, 4);
    }

    #[test]
    fn suspends_once_settled_and_resumes_on_restart() {
        let mut driver = TickDriver::new(DriverConfig::default());
        let mut simulation = simulation();

        let mut settled = false;
        for _ in 0..400 {
            settled |= driver.advance(&mut simulation, 1.0, |_| {}).settled;
        }
        assert!(settled);
        assert!(!simulation.is_active());
        assert_eq!(driver.advance(&mut simulation, 1.0, |_| {}).ticks, 0);

        simulation.restart();
        assert!(driver.advance(&mut simulation, 1.0, |_| {}).ticks > 0);
    }

    #[test]
    fn stopped_simulation_does_not_tick() {
        let mut driver = TickDriver::new(DriverConfig::default());
        let mut simulation = simulation();
        simulation.stop();

        assert_eq!(driver.advance(&mut simulation, 1.0, |_| {}).ticks, 0);
        assert_eq!(simulation.tick_count(), 0);
    }
}
