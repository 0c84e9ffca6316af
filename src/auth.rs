use anyhow::{Context, Result, bail};
use std::io::{self, BufRead, IsTerminal, Read};
use zeroize::Zeroizing;

pub const PASSPHRASE_ENV: &str = "HUSHDROP_PASSPHRASE";

/// Reads the passphrase for a deterministic key pair.
pub fn read_new_passphrase() -> Result<Zeroizing<String>> {
    //  Environment Variable
    //  HUSHDROP_PASSPHRASE="correct horse battery staple" hushdrop keygen --passphrase
    if let Ok(pw) = std::env::var(PASSPHRASE_ENV) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    //  stdin (Pipeline)
    if !io::stdin().is_terminal() {
        let mut pw = Zeroizing::new(String::new());
        io::stdin().lock().read_line(&mut pw)?;
        trim_newline(&mut pw);

        if pw.is_empty() {
            bail!("no passphrase provided");
        }
        return Ok(pw);
    }

    // the same passphrase must reproduce the same identity later, so confirm it
    let pw1 = Zeroizing::new(rpassword::prompt_password("Passphrase: ")?);
    let pw2 = Zeroizing::new(rpassword::prompt_password("Confirm passphrase: ")?);

    if pw1.is_empty() {
        bail!("passphrase cannot be empty");
    }

    if pw1 != pw2 {
        bail!("passphrases do not match");
    }

    Ok(pw1)
}

/// Takes the message from the command line or, failing that, all of stdin.
pub fn read_message(arg: Option<String>) -> Result<Zeroizing<String>> {
    if let Some(message) = arg {
        return Ok(Zeroizing::new(message));
    }

    if io::stdin().is_terminal() {
        eprintln!("Enter message, end with Ctrl-D:");
    }
    let mut message = Zeroizing::new(String::new());
    io::stdin()
        .read_to_string(&mut message)
        .context("failed to read message from stdin")?;
    trim_newline(&mut message);
    Ok(message)
}

fn trim_newline(s: &mut String) {
    while s.ends_with('\n') || s.ends_with('\r') {
        s.pop();
    }
}
