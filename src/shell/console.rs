//! Line-oriented terminal I/O over any async reader/writer pair.

use tokio::io::{
    self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout,
};

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<BufReader<Stdin>, Stdout> {
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Writes `line` followed by a newline.
    ///
    /// # Errors
    /// Returns the underlying write error.
    pub async fn say(&mut self, line: &str) -> io::Result<()> {
        self.output.write_all(line.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await
    }

    /// Shows `prompt` and reads one line without its line ending.
    /// `None` means the input is closed.
    ///
    /// # Errors
    /// Returns the underlying read or write error.
    pub async fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.output.write_all(prompt.as_bytes()).await?;
        self.output.flush().await?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        let len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(len);
        Ok(Some(line))
    }

    /// Asks a yes/no question; anything but `y`/`yes` is a no.
    ///
    /// # Errors
    /// Returns the underlying read or write error.
    pub async fn confirm(&mut self, question: &str) -> io::Result<Option<bool>> {
        let answer = self.ask(&format!("{question} [y/N] ")).await?;
        Ok(answer.map(|answer| {
            matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
        }))
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}
