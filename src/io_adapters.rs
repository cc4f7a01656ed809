use crate::command::OutputStream;
use std::cell::RefCell;
use std::io::{Result as IoResult, Write};
use std::process::Stdio;
use std::rc::Rc;

/// Memory-backed writer for capturing what the shell prints.
///
/// Cloning the handle returned by [`MemWriter::with_handle`] lets a caller read
/// the collected bytes after the writer itself has been moved into an
/// [`crate::Interpreter`].
#[derive(Default)]
pub struct MemWriter {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl MemWriter {
    /// Public constructor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return inner Rc so caller can read collected bytes after command execution.
    pub fn into_inner(self) -> Rc<RefCell<Vec<u8>>> {
        self.buf
    }

    /// Convenience: create writer and return (writer, rc_handle).
    pub fn with_handle() -> (Self, Rc<RefCell<Vec<u8>>>) {
        let mw = MemWriter::new();
        let rc = mw.buf.clone();
        (mw, rc)
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

impl OutputStream for MemWriter {
    /// Child processes cannot write into this buffer, so their output is discarded.
    fn stdio(&self) -> Stdio {
        Stdio::null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_sees_writes() {
        let (mut writer, handle) = MemWriter::with_handle();
        write!(writer, "abc").unwrap();
        writeln!(writer, "def").unwrap();
        assert_eq!(handle.borrow().as_slice(), b"abcdef\n");
    }

    #[test]
    fn into_inner_keeps_bytes() {
        let mut writer = MemWriter::new();
        writer.write_all(b"kept").unwrap();
        assert_eq!(writer.into_inner().borrow().as_slice(), b"kept");
    }
}
