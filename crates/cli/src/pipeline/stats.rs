//! Bridge run statistics.

use std::time::Duration;

use dispatcher::PublisherStats;
use ingestion::AcquisitionStats;

/// Statistics from one bridge run
#[derive(Debug, Clone, Default)]
pub struct BridgeStats {
    pub acquisition: AcquisitionStats,
    pub publisher: PublisherStats,
    /// Wall-clock duration of the run
    pub duration: Duration,
}

impl BridgeStats {
    /// Average forwarded poses per second
    pub fn publish_rate(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.publisher.published as f64 / secs
        } else {
            0.0
        }
    }

    /// Share of due ticks that forwarded a pose, in percent
    pub fn publish_ratio(&self) -> f64 {
        if self.publisher.ticks > 0 {
            self.publisher.published as f64 / self.publisher.ticks as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        let a = &self.acquisition;
        let p = &self.publisher;

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Bridge Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Poses published: {}", p.published);
        println!("   └─ Publish rate: {:.2} Hz", self.publish_rate());

        println!("\n📡 Acquisition");
        println!("   ├─ Polls: {}", a.polls);
        println!("   ├─ Poses written: {}", a.poses_written);
        println!("   ├─ Connects: {} ({} reconnects)", a.connects, a.reconnects);
        println!("   └─ Failures: {}", a.failures);

        println!("\n📈 Publisher");
        println!("   ├─ Ticks: {} ({:.1}% published)", p.ticks, self.publish_ratio());
        println!("   ├─ Skipped (empty cache): {}", p.skipped_empty);
        println!("   ├─ Skipped (unchanged): {}", p.skipped_unchanged);
        println!("   ├─ Missed intervals: {}", p.missed_intervals);
        println!("   └─ Sink retries: {}", p.retries);

        println!();
    }
}
