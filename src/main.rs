#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]

use std::{error::Error, sync::Arc, time::Duration};

use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use log::{info, warn};
use mirai_alert::{
    alarm::{AlarmId, NewAlarm, SoundName},
    communication,
    config::Config,
    error::AlarmError,
    local_now,
    notification::LocalNotificationCenter,
    receiver::AlarmDispatcher,
    scheduler::{NotificationScheduler, ScheduleOutcome},
    service::AlarmService,
    sound::{asset_candidates, AudioBackend, RodioBackend, SilentBackend, SoundPlayer},
    store::AlarmStore,
    ticker::Ticker,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// use a throwaway store filled with sample alarms
    #[clap(long)]
    demo: bool,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// write the default config and create the sounds directory
    Init {
        #[clap(long, short)]
        force: bool,
    },
    /// print every alarm, soonest first
    List,
    /// add an alarm, e.g. `add 2026-10-20 07:30 --note "Morning run" --sound Radar`
    Add {
        date: String,
        time: String,
        #[clap(long, short)]
        note: Option<String>,
        #[clap(long, short, default_value = "Default")]
        sound: String,
    },
    Remove {
        id: AlarmId,
    },
    /// enable a disabled alarm or disable an enabled one
    Toggle {
        id: AlarmId,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    // initialize the logger
    simple_file_logger::init_logger!("mirai_alert").expect("couldn't initialize logger");

    let args = Args::parse();
    let config = Config::load(Config::config_path()?).unwrap_or_else(|e| {
        warn!("{e}, using the default config");
        Config::default()
    });

    let (events, incoming) = communication::channel();
    let center = Arc::new(LocalNotificationCenter::new(
        config.notifications.allow,
        events,
    ));
    let scheduler = Arc::new(NotificationScheduler::new(center.clone()));
    if config.notifications.asked {
        scheduler.request_permission();
    }
    let store = if args.demo {
        let mut store = AlarmStore::in_memory();
        store.seed_samples(local_now())?;
        store
    } else {
        AlarmStore::open(Config::store_path()?)?
    };
    let mut service = AlarmService::new(store, scheduler);

    match args.command {
        Some(Command::Init { force }) => {
            if force || !Config::is_config_present() {
                Config::new().save(Config::config_path()?)?;
            }
            let sounds = config.sounds_path()?;
            std::fs::create_dir_all(&sounds)?;
            println!("put alarm sounds in {}:", sounds.display());
            for sound in SoundName::ALL {
                println!("  {sound}: {}", asset_candidates(sound).join(" or "));
            }
            return Ok(());
        }
        Some(Command::List) => {
            for alarm in service.alarms() {
                println!(
                    "{} {} {:<7} {:<8} {}",
                    alarm.id,
                    alarm.date.format("%Y-%m-%d %H:%M"),
                    alarm.sound,
                    if alarm.enabled { "enabled" } else { "disabled" },
                    alarm.note_or_empty()
                );
            }
            return Ok(());
        }
        Some(Command::Add {
            date,
            time,
            note,
            sound,
        }) => {
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|_| AlarmError::InvalidDate(date.clone()))?;
            let time = NaiveTime::parse_from_str(&time, "%H:%M")
                .map_err(|_| AlarmError::InvalidDate(time.clone()))?;
            let new = NewAlarm::new(
                date.and_time(time),
                note.as_deref().unwrap_or_default(),
                SoundName::from_name(&sound),
            );
            let saved = service.create(new, local_now())?;
            println!("added alarm {}", saved.alarm.id);
            if saved.schedule != ScheduleOutcome::Scheduled {
                println!("it will be scheduled the next time the clock is running");
            }
            return Ok(());
        }
        Some(Command::Remove { id }) => {
            service.delete(id)?;
            println!("removed alarm {id}");
            return Ok(());
        }
        Some(Command::Toggle { id }) => {
            let saved = service.toggle(id, local_now())?;
            println!(
                "alarm {id} is now {}",
                if saved.alarm.enabled { "enabled" } else { "disabled" }
            );
            return Ok(());
        }
        None => {}
    }

    // the stream has to outlive the gui, dropping it silences every sink
    let stream = rodio::OutputStreamBuilder::open_default_stream();
    let backend: Box<dyn AudioBackend> = match &stream {
        Ok(stream) => Box::new(RodioBackend::new(stream.mixer().clone())),
        Err(e) => {
            warn!("couldn't open audio output: {e}");
            Box::new(SilentBackend)
        }
    };
    let player = SoundPlayer::new(backend, config.sounds_path()?, config.sound.beep_interval());
    let dispatcher = AlarmDispatcher::new(incoming, Arc::new(player));

    let restored = service.restore_triggers(local_now());
    info!("restored {restored} alarm triggers");

    let firing = Arc::clone(&center);
    let _trigger_clock = Ticker::spawn(Duration::from_secs(1), move || {
        firing.fire_due(local_now());
    });

    mirai_alert::run(config, service, dispatcher, move |ctx| {
        center.set_waker(move || ctx.request_repaint());
    })
    .map_err(std::convert::Into::into)
}
