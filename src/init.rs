use std::io::Write;

use anyhow::Result;
use chrono::Local;
use env_logger::Env;

/// Installs the logger for applications and tests embedding the library.
/// Level comes from `RUST_LOG`, `info` by default. Calling it again is a
/// no-op.
pub fn init() -> Result<()> {
    log_init();
    Ok(())
}

fn log_init() {
    let env = Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env)
        .format(|fmt, record| {
            writeln!(
                fmt,
                "[{} {}] {}",
                Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                &record.args()
            )
        })
        .try_init();
}

#[test]
fn init_twice() -> anyhow::Result<()> {
    init()?;
    init()?;
    log::debug!("logger installed");
    Ok(())
}
