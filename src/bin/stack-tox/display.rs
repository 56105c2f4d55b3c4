use std::io::{self, Write};

use anyhow::Error;

pub fn print_error(err: &Error) {
    let mut stderr = io::stderr().lock();

    let _ = writeln!(stderr, "Error: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  Caused by: {cause}");
        source = cause.source();
    }
}
