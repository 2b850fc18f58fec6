use std::io::BufReader;
use std::net::TcpStream;

use hostpulse_core::{DashboardConfig, JsonLinesSource};

use crate::tui::app::App;
use crate::tui::feed::{Feed, Pacing};

pub fn run(config: DashboardConfig, addr: &str) {
    let stream = match TcpStream::connect(addr) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: cannot connect to {addr}: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = stream.set_nodelay(true) {
        log::debug!("set_nodelay failed: {e}");
    }
    log::debug!("connected to {addr}");

    let feed = Feed::spawn(JsonLinesSource::new(BufReader::new(stream)), Pacing::Live);
    let mut app = App::new(config, feed, format!("tcp {addr}"));
    if let Err(e) = app.run() {
        eprintln!("TUI error: {e}");
        std::process::exit(1);
    }
}
