use std::io::{self, BufRead, Write};

/// Asks a yes/no question; anything but `y`/`yes` (or end of input) is a no.
pub fn confirm(question: &str, input: &mut impl BufRead, output: &mut impl Write) -> io::Result<bool> {
	write!(output, "{question} [y/N] ")?;
	output.flush()?;

	let mut answer = String::new();
	if input.read_line(&mut answer)? == 0 {
		return Ok(false);
	}
	Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
