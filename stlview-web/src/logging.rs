/// Routes `tracing` events to the browser console
use std::io;
use tracing_subscriber::fmt::MakeWriter;

/// Buffers one formatted event and logs it to the console when dropped
pub struct ConsoleWriter {
    buffer: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if let Some(line) = console_line(&self.buffer) {
            web_sys::console::log_1(&line.into());
        }
    }
}

pub struct MakeConsoleWriter;

impl<'a> MakeWriter<'a> for MakeConsoleWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter { buffer: Vec::new() }
    }
}

/// Text of one buffered event without its trailing newline
fn console_line(buffer: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(buffer);
    let line = line.trim_end();
    (!line.is_empty()).then(|| line.to_string())
}

/// Install the console subscriber; later calls are no-ops
pub fn init() {
    // The browser has no clock source for the default timer and no ANSI
    let _ = tracing_subscriber::fmt()
        .with_writer(MakeConsoleWriter)
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_console_line_strips_newline() {
        assert_eq!(
            console_line(b" INFO stlview_web: uploaded mesh facets=12\n").as_deref(),
            Some(" INFO stlview_web: uploaded mesh facets=12")
        );
    }

    #[test]
    fn test_blank_events_are_skipped() {
        assert_eq!(console_line(b""), None);
        assert_eq!(console_line(b"\n"), None);
    }

    #[test]
    fn test_writer_buffers_until_dropped() {
        let mut writer = MakeConsoleWriter.make_writer();
        assert_eq!(writer.write(b"abc").unwrap(), 3);
        writer.flush().unwrap();
        assert_eq!(writer.buffer, b"abc");
        // Dropping a non-empty writer calls into the JS console
        writer.buffer.clear();
    }
}
