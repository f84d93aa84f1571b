use liesel::{Config, DeviceConfig, MemoryHost, Result, WriteCommand};
use siegenia::setup::DeviceSession;
use siegenia::DeviceLink;

use std::collections::HashMap;

use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task;

type Writes = HashMap<String, mpsc::UnboundedSender<WriteCommand>>;

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init_timed();

    let config = Config::from_env()?;
    info!("initialize {} devices", config.devices.len());

    let mut writes = Writes::new();
    let mut links = Vec::new();

    for device in config.devices {
        let (link, events) = DeviceLink::new(device.link.clone());
        let (sender, receiver) = mpsc::unbounded_channel();

        writes.insert(device.id.clone(), sender);
        links.push(link.clone());

        let session = DeviceSession::new(
            link,
            device.id.clone(),
            config.user.clone(),
            config.password.clone(),
        );

        task::spawn(run_device(device, session, events, receiver));
    }

    task::spawn(async move {
        if let Err(err) = read_commands(writes).await {
            error!("cannot read commands: {err}");
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    for link in links {
        link.disconnect(false).await;
    }

    Ok(())
}

async fn run_device(
    device: DeviceConfig,
    mut session: DeviceSession<DeviceLink>,
    mut events: mpsc::UnboundedReceiver<siegenia::LinkEvent>,
    mut writes: mpsc::UnboundedReceiver<WriteCommand>,
) {
    let mut host = MemoryHost::default();

    info!("{}: setting up {}", device.id, device.name);
    match session.run_setup(&mut host).await {
        Ok(()) => info!("{}: {} is ready", device.id, device.name),
        Err(err) => error!("{}: {err}", device.id),
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => session.handle_event(event, &mut host).await,
                None => break,
            },
            Some(command) = writes.recv() => {
                if let Err(err) = session.write_property(&command.path, command.value).await {
                    error!("{}: cannot write {}: {err}", device.id, command.path);
                }
            }
        }
    }
}

async fn read_commands(writes: Writes) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match WriteCommand::parse(&line) {
            Ok(command) => command,
            Err(err) => {
                warn!("{err}");
                continue;
            }
        };

        match writes.get(&command.device_id) {
            Some(sender) => {
                _ = sender.send(command);
            }
            None => warn!("unknown device {}", command.device_id),
        }
    }

    Ok(())
}
