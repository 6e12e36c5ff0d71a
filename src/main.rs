use xtouch_ext_driver::{
    ctrl_surf::{Event, FaderEvent, FaderEventKind, KnobEventKind},
    Config, ControlSurface,
};

use std::sync::{Arc, Weak};

fn run() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_yaml_file(&path)?,
        None => Config::default(),
    };

    let surface = Arc::new(ControlSurface::connect(config)?);

    // Strip callbacks only hold a weak ref so the surface can still be dropped.
    for fader in 0..8u8 {
        let surf = Arc::downgrade(&surface);
        surface.bind_fader(fader, FaderEventKind::Level, move |event| {
            if let Event::Fader {
                fader,
                event: FaderEvent::Level(level),
            } = *event
            {
                log::info!("Fader {fader} level {level}");
                echo_fader(&surf, fader, level);
            }
        })?;

        surface.bind_knob(fader, KnobEventKind::DoublePress, move |event| {
            log::info!("{event:?}");
        })?;

        surface.set_text(fader, 0, &format!("Fader {}", fader + 1))?;
    }

    log::info!("Driver running");
    loop {
        std::thread::park();
    }
}

fn echo_fader(surface: &Weak<ControlSurface>, fader: u8, level: u16) {
    if let Some(surface) = surface.upgrade() {
        if let Err(err) = surface.set_fader(fader, level as i32) {
            log::error!("{err}");
        }
    }
}

fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    if let Err(err) = run() {
        log::error!("Error: {}", err);
        for source in err.chain().skip(1) {
            log::error!("\t{}", source)
        }
        std::process::exit(1);
    }
}
