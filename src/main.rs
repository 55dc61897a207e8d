use anyhow::Result;
use colored::Colorize;
use edx::command::Outcome;
use edx::config::Config;
use edx::host::{self, Host, SystemHost, WriteMode};
use edx::{cli, logger, Editor};
use std::path::Path;

/// Fallback filename for the hangup dump of a dirty buffer.
const HANGUP_FILE: &str = "edx.hup";

fn main() -> Result<()> {
    let args = cli::parse_args()?;

    if args.config_path {
        let path = Config::ensure_default_file()?;
        println!("{}", path.display());
        return Ok(());
    }

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} {e:#}", "warning:".yellow());
            Config::default()
        }
    };

    let debug = args.debug || config.logging.debug.unwrap_or(false);
    let _log_guard = logger::init_debug_logging(debug)?;

    host::install_signal_handlers();
    let mut editor = Editor::new(SystemHost::new());

    if let Some(prompt) = config.editor.prompt.clone() {
        editor.session.prompt = prompt;
    }
    if let Some(scroll) = config.editor.scroll_lines {
        if scroll > 0 {
            editor.session.scroll = scroll;
        }
    }
    editor.session.verbose = args.verbose || config.editor.verbose_errors.unwrap_or(false);
    editor.session.silent = args.silent;
    if let Some(prompt) = args.prompt {
        editor.session.prompt = prompt;
        editor.session.prompt_enabled = true;
    }

    if let Some(file) = &args.file {
        if let Err(e) = editor.open(Path::new(file)) {
            editor.report_error(e);
        }
    }

    run_loop(&mut editor)
}

fn run_loop(editor: &mut Editor<SystemHost>) -> Result<()> {
    loop {
        if editor.host.hangup_pending() {
            hangup_exit(editor);
        }

        let prompt = editor
            .session
            .prompt_enabled
            .then(|| editor.session.prompt.clone());
        let line = match editor.host.read_line(prompt.as_deref()) {
            Ok(Some(line)) => line,
            // End of input behaves as q, dirty guard included.
            Ok(None) => "q".to_string(),
            Err(e) => {
                if editor.host.hangup_pending() {
                    hangup_exit(editor);
                }
                if editor.host.take_interrupt() {
                    editor.report_error(edx::EdError::Interrupted);
                    continue;
                }
                return Err(e.into());
            }
        };

        match editor.execute(&line) {
            Ok(Outcome::Continue) => {}
            Ok(Outcome::Quit) => break,
            Err(e) => editor.report_error(e),
        }
    }
    Ok(())
}

/// Best-effort dump of a dirty buffer to the fallback file, then exit.
fn hangup_exit(editor: &mut Editor<SystemHost>) -> ! {
    if editor.session.buffer.dirty {
        let lines = editor.session.buffer.all_lines().to_vec();
        let _ = editor
            .host
            .write_file(Path::new(HANGUP_FILE), &lines, WriteMode::Truncate);
    }
    std::process::exit(1);
}
