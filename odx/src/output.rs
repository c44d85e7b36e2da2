//! Rendering built stages.

use std::io;

use crate::stages::StageGroups;

/// Write stages as pretty-printed JSON, keyed by card id then service day.
pub fn write_json<W: io::Write>(mut writer: W, stages: &StageGroups) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, stages)?;
    writeln!(writer)
}

/// Write stages as text: a header per card-day, then one line per stage.
pub fn write_text<W: io::Write>(mut writer: W, stages: &StageGroups) -> io::Result<()> {
    for (card, days) in stages {
        for (day, day_stages) in days {
            writeln!(writer, "{card} {day} ({} stages)", day_stages.len())?;
            for stage in day_stages {
                writeln!(writer, "  {stage}")?;
            }
        }
    }
    Ok(())
}
