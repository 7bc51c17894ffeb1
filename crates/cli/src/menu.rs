//! Interactive menu over a closed set of commands.

use std::io::{self, BufRead, Write};

use outlooksync_domain::constants::EXIT_SUCCESS;

use crate::commands::App;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Exit,
    SyncEvents,
    ListCalendars,
}

pub fn parse_choice(input: &str) -> Option<MenuChoice> {
    match input.trim() {
        "0" => Some(MenuChoice::Exit),
        "1" => Some(MenuChoice::SyncEvents),
        "2" => Some(MenuChoice::ListCalendars),
        _ => None,
    }
}

/// Show the options and read until a valid choice arrives. End of input
/// counts as [`MenuChoice::Exit`].
pub fn prompt_choice(input: &mut impl BufRead, out: &mut impl Write) -> io::Result<MenuChoice> {
    loop {
        writeln!(out, "Please choose one of the following options:")?;
        writeln!(out, "0. Exit")?;
        writeln!(out, "1. Sync Events")?;
        writeln!(out, "2. Get Calendars")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(MenuChoice::Exit);
        }

        match parse_choice(&line) {
            Some(choice) => return Ok(choice),
            None => writeln!(out, "Invalid choice! Please try again.")?,
        }
    }
}

/// Dispatch choices until the user exits.
///
/// Returns the highest exit code produced by a sync. A fatal error ends the
/// menu.
pub async fn run(
    app: &App,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<u8> {
    let mut code = EXIT_SUCCESS;

    loop {
        match prompt_choice(input, out)? {
            MenuChoice::Exit => {
                writeln!(out, "Goodbye...")?;
                return Ok(code);
            }
            MenuChoice::SyncEvents => code = code.max(app.sync(out).await?),
            MenuChoice::ListCalendars => {
                app.calendars(out).await?;
            }
        }
        writeln!(out)?;
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn parses_the_three_options() {
        assert_eq!(parse_choice("0\n"), Some(MenuChoice::Exit));
        assert_eq!(parse_choice(" 1 "), Some(MenuChoice::SyncEvents));
        assert_eq!(parse_choice("2\r\n"), Some(MenuChoice::ListCalendars));
        assert_eq!(parse_choice("3"), None);
        assert_eq!(parse_choice("sync"), None);
    }

    #[test]
    fn invalid_input_prompts_again() {
        let mut input = Cursor::new("9\nabc\n2\n");
        let mut out = Vec::new();

        let choice = prompt_choice(&mut input, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(choice, MenuChoice::ListCalendars);
        assert_eq!(text.matches("Invalid choice! Please try again.").count(), 2);
        assert_eq!(text.matches("0. Exit").count(), 3);
    }

    #[test]
    fn end_of_input_exits() {
        let mut input = Cursor::new("");
        let mut out = Vec::new();

        assert_eq!(prompt_choice(&mut input, &mut out).unwrap(), MenuChoice::Exit);
    }
}
