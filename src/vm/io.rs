//! Console I/O used by the print and read builtins.

use std::cell::RefCell;
use std::fmt;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::rc::Rc;

use sable_core::RuntimeError;

/// The VM's output sink and input source.
pub struct Console {
    output: Box<dyn Write>,
    input: Box<dyn BufRead>,
}

impl Default for Console {
    fn default() -> Self {
        Self {
            output: Box::new(io::stdout()),
            input: Box::new(BufReader::new(io::stdin())),
        }
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

impl Console {
    pub fn set_output(&mut self, output: impl Write + 'static) {
        self.output = Box::new(output);
    }

    pub fn set_input(&mut self, input: impl BufRead + 'static) {
        self.input = Box::new(input);
    }

    pub fn write(&mut self, text: &str) -> Result<(), RuntimeError> {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()?;
        Ok(())
    }

    /// Reads one line without its terminator.
    pub fn read_line(&mut self) -> Result<String, RuntimeError> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(RuntimeError::EndOfInput);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(line)
    }

    /// Reads one UTF-8 encoded character.
    pub fn read_char(&mut self) -> Result<char, RuntimeError> {
        let mut buf = [0u8; 4];
        if self.input.read(&mut buf[..1])? == 0 {
            return Err(RuntimeError::EndOfInput);
        }
        let width = match buf[0] {
            0x00..=0x7F => 1,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return Err(invalid_utf8()),
        };
        self.input.read_exact(&mut buf[1..width])?;
        std::str::from_utf8(&buf[..width])
            .ok()
            .and_then(|s| s.chars().next())
            .ok_or_else(invalid_utf8)
    }
}

fn invalid_utf8() -> RuntimeError {
    RuntimeError::Io {
        message: "input is not valid UTF-8".to_string(),
    }
}

/// A cloneable in-memory sink, for capturing script output.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer(Rc<RefCell<Vec<u8>>>);

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn captured_output() {
        let buffer = OutputBuffer::new();
        let mut console = Console::default();
        console.set_output(buffer.clone());
        console.write("hello ").unwrap();
        console.write("world").unwrap();
        assert_eq!(buffer.contents(), "hello world");
    }

    #[test]
    fn lines_and_chars() {
        let mut console = Console::default();
        console.set_input(Cursor::new("first\r\nsé\n"));
        assert_eq!(console.read_line().unwrap(), "first");
        assert_eq!(console.read_char().unwrap(), 's');
        assert_eq!(console.read_char().unwrap(), 'é');
        assert_eq!(console.read_char().unwrap(), '\n');
        assert_eq!(console.read_char(), Err(RuntimeError::EndOfInput));
        assert_eq!(console.read_line(), Err(RuntimeError::EndOfInput));
    }
}
