use std::io::{self, BufRead, Write};

/// Asks a yes/no question; anything but `y` or `yes` counts as no.
pub fn confirm<R: BufRead, W: Write>(question: &str, reader: &mut R, writer: &mut W) -> io::Result<bool> {
    write!(writer, "{} [y/N] ", question)?;
    writer.flush()?;

    let mut answer = String::new();
    reader.read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ask(input: &str) -> (bool, String) {
        let mut reader = Cursor::new(input.as_bytes().to_vec());
        let mut writer = Vec::new();
        let answer = confirm("Generate 12 jobs?", &mut reader, &mut writer).unwrap();
        (answer, String::from_utf8(writer).unwrap())
    }

    #[test]
    fn accepts_yes_in_any_case() {
        assert!(ask("y\n").0);
        assert!(ask("YES\n").0);
        assert!(ask("  Yes  \n").0);
    }

    #[test]
    fn everything_else_declines() {
        assert!(!ask("n\n").0);
        assert!(!ask("\n").0);
        assert!(!ask("").0);
        assert!(!ask("yep\n").0);
    }

    #[test]
    fn writes_the_question() {
        let (_, prompt) = ask("n\n");
        assert_eq!(prompt, "Generate 12 jobs? [y/N] ");
    }
}
