//! The `ifjc` binary: IFJ25 source on standard input, IFJcode25 on
//! standard output, the error category as the process exit code.

use std::io::{self, Write};

use ifjc_util::{Diagnostic, Handler};

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let mut handler = Handler::new();

    let program = match ifjc_drv::compile_from(io::stdin().lock()) {
        Ok(program) => program,
        Err(err) => {
            handler.emit(Diagnostic::error(err.to_string()));
            return err.exit_code();
        }
    };

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(program.as_bytes())
        .and_then(|()| stdout.flush())
    {
        handler.emit(Diagnostic::error(format!("failed to write output: {err}")));
        return 99;
    }
    0
}
