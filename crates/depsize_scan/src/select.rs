use anyhow::{Result, bail};
use std::io::{BufRead, Write};

/// Narrows the packages of a project down to the ones to scan.
pub trait PackageSelector {
    fn select(&mut self, project: &str, packages: &[String]) -> Result<Vec<String>>;
}

/// Numbered multi-select prompt over any reader/writer pair.
pub struct PromptSelector<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptSelector<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

/// Parse an answer such as `1,3 4` or `all` into zero-based indices.
fn parse_selection(answer: &str, count: usize) -> Result<Vec<usize>> {
    let answer = answer.trim();
    if answer.eq_ignore_ascii_case("all") || answer == "*" {
        return Ok((0..count).collect());
    }

    let mut picked = Vec::new();
    for token in answer.split(|c: char| c == ',' || c.is_whitespace()).filter(|t| !t.is_empty()) {
        let idx = match token.parse::<usize>() {
            Ok(n) if (1..=count).contains(&n) => n - 1,
            _ => bail!("Invalid selection '{}', expected numbers between 1 and {}", token, count),
        };
        if !picked.contains(&idx) {
            picked.push(idx);
        }
    }
    picked.sort_unstable();
    Ok(picked)
}

impl<R: BufRead, W: Write> PackageSelector for PromptSelector<R, W> {
    fn select(&mut self, project: &str, packages: &[String]) -> Result<Vec<String>> {
        if packages.is_empty() {
            return Ok(vec![]);
        }

        writeln!(self.output, "Select packages to scan in {}?", project)?;
        for (idx, pkg) in packages.iter().enumerate() {
            writeln!(self.output, "  {:>2}) {}", idx + 1, pkg)?;
        }

        loop {
            write!(self.output, "Numbers separated by commas, or 'all': ")?;
            self.output.flush()?;

            let mut answer = String::new();
            if self.input.read_line(&mut answer)? == 0 {
                // EOF selects nothing
                return Ok(vec![]);
            }
            match parse_selection(&answer, packages.len()) {
                Ok(indices) => return Ok(indices.into_iter().map(|i| packages[i].clone()).collect()),
                Err(e) => writeln!(self.output, "{}", e)?,
            }
        }
    }
}
