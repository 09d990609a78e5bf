// Entrypoint for the CLI application.
// - Keeps `main` small: create the backend client and hand it to the
//   interactive app.
// - Returns `anyhow::Result` so an interrupted input stream or a
//   configuration error terminates the process with a message.

use shorturl_cli::{api::HttpBackend, console::StdConsole, ui::App};

fn main() -> anyhow::Result<()> {
    // Base URL comes from the `SHORTS_API_URL` environment variable,
    // defaulting to a local development server.
    let backend = HttpBackend::from_env()?;

    // Run the main menu. This call blocks until the user exits.
    App::new(backend, StdConsole::new()).run()?;
    Ok(())
}
