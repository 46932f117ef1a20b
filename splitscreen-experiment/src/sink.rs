use crate::error::SinkError;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Where committed judgments go. The state machine only talks to this trait.
pub trait JudgmentSink {
    fn write(&mut self, fields: &[String]) -> Result<(), SinkError>;
    /// Flush and release. Calling it again is a no-op.
    fn close(&mut self) -> Result<(), SinkError>;
    fn is_closed(&self) -> bool;
}

/// Append-only tab-separated result file.
///
/// The header goes out at `open`; every `write` is flushed before it returns
/// so a crash loses at most the trial in flight.
#[derive(Debug)]
pub struct ResultSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    lines: usize,
    rewritten: usize,
}

impl ResultSink {
    pub fn open<S: AsRef<str>>(path: impl AsRef<Path>, header: &[S]) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|source| SinkError::Open {
            path: path.clone(),
            source,
        })?;

        let mut sink = Self {
            path,
            writer: Some(BufWriter::new(file)),
            lines: 0,
            rewritten: 0,
        };
        sink.write_line(header)?;
        tracing::info!(path = %sink.path.display(), "result file opened");
        Ok(sink)
    }

    fn write_line<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<(), SinkError> {
        let writer = self.writer.as_mut().ok_or(SinkError::Closed)?;
        let mut cleaned = Vec::with_capacity(fields.len());
        for field in fields {
            let field = field.as_ref();
            let clean = sanitize(field);
            if let Cow::Owned(replaced) = &clean {
                self.rewritten += 1;
                tracing::warn!(
                    original = ?field,
                    written = %replaced,
                    "tab or line break in field replaced with a space"
                );
            }
            cleaned.push(clean);
        }
        let line = cleaned.join("\t");
        writeln!(writer, "{line}")?;
        writer.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Judgment lines written so far, header excluded.
    pub fn lines_written(&self) -> usize {
        self.lines
    }

    /// Fields that had tabs or line breaks replaced before writing.
    pub fn rewritten_fields(&self) -> usize {
        self.rewritten
    }
}

impl JudgmentSink for ResultSink {
    fn write(&mut self, fields: &[String]) -> Result<(), SinkError> {
        self.write_line(fields)?;
        self.lines += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        writer.flush()?;
        writer.get_ref().sync_all()?;
        tracing::info!(path = %self.path.display(), lines = self.lines, "result file closed");
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.writer.is_none()
    }
}

/// Tabs and line breaks inside a field would shift columns.
fn sanitize(field: &str) -> Cow<'_, str> {
    if field.contains(['\t', '\n', '\r']) {
        field.replace(['\t', '\n', '\r'], " ").into()
    } else {
        field.into()
    }
}
