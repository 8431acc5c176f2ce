//! Event reporter: renders fired events as text lines or one-line JSON.

use crate::detector::MonitorEvent;
use crate::guard::FatalCondition;
use clap::ValueEnum;
use std::fmt;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for MonitorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorEvent::BurnBlock {
                burn_height,
                stx_height,
                tx_count,
            } => write!(
                f,
                "Burn block: {}\tSTX block: {}\t{} TX",
                burn_height, stx_height, tx_count
            ),
            MonitorEvent::EpochActivated { .. } => f.write_str("Starting Nakamoto!"),
            MonitorEvent::PreparePhase {
                next_cycle,
                next_signers,
            } => {
                write!(f, "Prepare phase started. Next cycle is {}", next_cycle)?;
                if let Some(n) = next_signers {
                    write!(f, "\nNext cycle ({}) has {} signers", next_cycle, n)?;
                }
                Ok(())
            }
            MonitorEvent::StacksBlock {
                stx_height,
                tx_count,
                gap,
            } => write!(
                f,
                "Nakamoto block: {}\t{} TX\t({:.2} seconds)",
                stx_height,
                tx_count,
                gap.as_secs_f64()
            ),
            MonitorEvent::RewardCycle { cycle, signers } => {
                write!(f, "New cycle started ({}) with {} signers", cycle, signers)
            }
        }
    }
}

/// Writes events to a sink and mirrors them as tracing records.
pub struct Reporter<W: Write> {
    format: OutputFormat,
    out: W,
}

impl Reporter<io::Stdout> {
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(format, io::stdout())
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(format: OutputFormat, out: W) -> Self {
        Self { format, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn events(&mut self, events: &[MonitorEvent]) -> io::Result<()> {
        for ev in events {
            tracing::debug!(event = ?ev, "transition");
            match self.format {
                OutputFormat::Text => writeln!(self.out, "{}", ev)?,
                OutputFormat::Json => {
                    serde_json::to_writer(&mut self.out, ev)?;
                    writeln!(self.out)?;
                }
            }
        }
        self.out.flush()
    }

    pub fn fatal(&mut self, cond: &FatalCondition) -> io::Result<()> {
        tracing::error!(
            reward_cycle = cond.reward_cycle,
            activation_cycle = cond.activation_cycle,
            cause = ?cond.cause,
            "no signers after Epoch 3.0 activation"
        );
        match self.format {
            OutputFormat::Text => writeln!(self.out, "{}", cond)?,
            OutputFormat::Json => {
                let line = serde_json::json!({ "event": "fatal", "condition": cond });
                writeln!(self.out, "{}", line)?;
            }
        }
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::SignerShortfall;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn rendered(format: OutputFormat, events: &[MonitorEvent]) -> String {
        let mut r = Reporter::new(format, Vec::new());
        r.events(events).unwrap();
        String::from_utf8(r.into_inner()).unwrap()
    }

    #[test]
    fn text_lines() {
        let out = rendered(
            OutputFormat::Text,
            &[
                MonitorEvent::BurnBlock {
                    burn_height: 101,
                    stx_height: 201,
                    tx_count: 3,
                },
                MonitorEvent::EpochActivated { burn_height: 101 },
                MonitorEvent::PreparePhase {
                    next_cycle: 6,
                    next_signers: Some(2),
                },
                MonitorEvent::StacksBlock {
                    stx_height: 202,
                    tx_count: 1,
                    gap: Duration::from_millis(1234),
                },
                MonitorEvent::RewardCycle {
                    cycle: 6,
                    signers: 0,
                },
            ],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Burn block: 101\tSTX block: 201\t3 TX",
                "Starting Nakamoto!",
                "Prepare phase started. Next cycle is 6",
                "Next cycle (6) has 2 signers",
                "Nakamoto block: 202\t1 TX\t(1.23 seconds)",
                "New cycle started (6) with 0 signers",
            ]
        );
    }

    #[derive(Clone, Default)]
    struct LogBuf(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn events_stay_off_the_info_log() {
        let logs = LogBuf::default();
        let sink = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || sink.clone())
            .finish();
        let out = tracing::subscriber::with_default(subscriber, || {
            rendered(
                OutputFormat::Text,
                &[MonitorEvent::RewardCycle {
                    cycle: 4,
                    signers: 2,
                }],
            )
        });
        assert_eq!(out, "New cycle started (4) with 2 signers\n");
        assert!(logs.0.lock().unwrap().is_empty());
    }

    #[test]
    fn prepare_phase_without_next_set_is_one_line() {
        let out = rendered(
            OutputFormat::Text,
            &[MonitorEvent::PreparePhase {
                next_cycle: 9,
                next_signers: None,
            }],
        );
        assert_eq!(out, "Prepare phase started. Next cycle is 9\n");
    }

    #[test]
    fn json_lines() {
        let out = rendered(
            OutputFormat::Json,
            &[MonitorEvent::RewardCycle {
                cycle: 4,
                signers: 2,
            }],
        );
        let v: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(v["event"], "reward_cycle");
        assert_eq!(v["cycle"], 4);
        assert_eq!(v["signers"], 2);
    }

    #[test]
    fn fatal_rendering() {
        let cond = FatalCondition {
            reward_cycle: 7,
            activation_cycle: 6,
            cause: SignerShortfall::Empty,
        };
        let mut r = Reporter::new(OutputFormat::Json, Vec::new());
        r.fatal(&cond).unwrap();
        let v: serde_json::Value =
            serde_json::from_slice(&r.into_inner()).unwrap();
        assert_eq!(v["event"], "fatal");
        assert_eq!(v["condition"]["cause"], "empty");

        let mut r = Reporter::new(OutputFormat::Text, Vec::new());
        r.fatal(&cond).unwrap();
        let text = String::from_utf8(r.into_inner()).unwrap();
        assert!(text.starts_with("FATAL: no signers while going in to Epoch 3.0"));
    }
}
