use clap::Parser;
use config::{Args, DashboardConfig};
use iced::{
    time,
    widget::{button, column, container, row, scrollable, text, text_input, Column, Container},
    Alignment, Element, Length, Subscription, Task, Theme,
};
use log::{debug, info};
use racecore::control::{
    PenaltyCommand, PenaltyDispatcher, PendingPenalty, PollOutcome, PollTicket, RaceControlClient,
    Selection, StatusPoller, Variant, DEFAULT_REASON,
};
use racecore::protocol::{PenaltyAction, StatusSnapshot};
use racecore::telemetry::MetricsRecorder;
use racecore::view::{header_text, session_line};
use std::sync::Arc;
use std::time::Duration;
use table::ActionMenus;

mod config;
mod table;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = DashboardConfig::resolve(Args::parse())?;
    let setup = Setup::from_config(&config)?;
    info!(
        "polling {} every {:?} ({} variant)",
        setup.client.endpoint().target(),
        setup.interval,
        setup.variant
    );

    iced::application(
        move || Dashboard::boot(setup.clone()),
        Dashboard::update,
        Dashboard::view,
    )
    .title(application_title)
    .subscription(application_subscription)
    .theme(application_theme)
    .run()
    .map_err(|err| anyhow::anyhow!("running dashboard: {err}"))
}

fn application_title(state: &Dashboard) -> String {
    match state.poller.snapshot() {
        Some(snapshot) => format!("Race Control - {}", header_text(snapshot)),
        None => "Race Control".into(),
    }
}

fn application_subscription(state: &Dashboard) -> Subscription<Message> {
    time::every(state.poller.interval()).map(|_| Message::Tick)
}

fn application_theme(_: &Dashboard) -> Theme {
    Theme::Dark
}

/// Resolved settings every window boot starts from.
#[derive(Debug, Clone)]
struct Setup {
    client: RaceControlClient,
    interval: Duration,
    confirm: bool,
    variant: Variant,
}

impl Setup {
    fn from_config(config: &DashboardConfig) -> anyhow::Result<Self> {
        let endpoint = config.endpoint()?;
        let client = RaceControlClient::new(endpoint, config.request_timeout())?;
        Ok(Self {
            client,
            interval: config.poll_interval(),
            confirm: config.confirm_penalties,
            variant: config.variant,
        })
    }
}

struct Dashboard {
    client: RaceControlClient,
    variant: Variant,
    poller: StatusPoller,
    dispatcher: PenaltyDispatcher,
    metrics: Arc<MetricsRecorder>,
    menus: ActionMenus,
}

#[derive(Debug, Clone)]
enum Message {
    Tick,
    StatusFetched(PollTicket, Result<StatusSnapshot, String>),
    ActionSelected(String, PenaltyAction),
    ReasonChanged(String),
    ConfirmPenalty,
    CancelPenalty,
    PenaltySent(PenaltyCommand, Result<(), String>),
}

impl Dashboard {
    fn boot(setup: Setup) -> (Self, Task<Message>) {
        let metrics = Arc::new(MetricsRecorder::new());
        let mut dashboard = Dashboard {
            client: setup.client,
            variant: setup.variant,
            poller: StatusPoller::new(setup.interval, metrics.clone()),
            dispatcher: PenaltyDispatcher::new(setup.confirm, metrics.clone()),
            metrics,
            menus: ActionMenus::default(),
        };
        let first_poll = dashboard.poll();
        (dashboard, first_poll)
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => state.poll(),
            Message::StatusFetched(ticket, result) => {
                if let PollOutcome::Published { vehicles } = state.poller.complete(ticket, result) {
                    debug!("status {} published with {} vehicles", ticket.cycle(), vehicles);
                }
                Task::none()
            }
            Message::ActionSelected(driver_name, action) => {
                match state.dispatcher.select(driver_name, action) {
                    Selection::Dispatch(command) => state.dispatch(command),
                    Selection::AwaitingConfirmation => Task::none(),
                }
            }
            Message::ReasonChanged(reason) => {
                state.dispatcher.edit_reason(reason);
                Task::none()
            }
            Message::ConfirmPenalty => match state.dispatcher.confirm() {
                Some(command) => state.dispatch(command),
                None => Task::none(),
            },
            Message::CancelPenalty => {
                if let Some(pending) = state.dispatcher.cancel() {
                    debug!("dismissed {} for {}", pending.action, pending.driver_name);
                }
                Task::none()
            }
            Message::PenaltySent(command, result) => {
                state.dispatcher.record_result(&command, result);
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let snapshot = state.poller.snapshot();

        let header: Element<'_, Message> = match snapshot {
            Some(snapshot) => snapshot_header(snapshot, state.variant),
            None => text("Waiting for race control...").size(24).into(),
        };

        let vehicles = snapshot
            .map(|snapshot| snapshot.vehicles.as_slice())
            .unwrap_or(&[]);
        let standings = column![
            table::header_row(),
            scrollable(table::vehicle_table(vehicles, &state.menus)).height(Length::Fill),
        ]
        .spacing(6);

        let activity = state.dispatcher.activity();
        let history_list = if activity.is_empty() {
            Column::new().push(text("No commands sent yet").size(12))
        } else {
            activity
                .entries()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry).size(12))
                })
        };

        let footer = column![
            text(state.metrics.snapshot().to_string()).size(12),
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(90.0))).padding(6),
        ]
        .spacing(6);

        let mut layout = Column::new().spacing(12).padding(20).push(header);
        if let Some(pending) = state.dispatcher.pending() {
            layout = layout.push(penalty_dialog(pending));
        }
        let layout = layout.push(standings).push(footer);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Starts a status request unless the previous one is still open.
    fn poll(&mut self) -> Task<Message> {
        match self.poller.begin_poll() {
            Some(ticket) => Task::perform(fetch_status(self.client.clone()), move |result| {
                Message::StatusFetched(ticket, result)
            }),
            None => Task::none(),
        }
    }

    fn dispatch(&self, command: PenaltyCommand) -> Task<Message> {
        let sent = command.clone();
        Task::perform(send_penalty(self.client.clone(), command), move |result| {
            Message::PenaltySent(sent, result)
        })
    }
}

fn snapshot_header(snapshot: &StatusSnapshot, variant: Variant) -> Element<'_, Message> {
    let mut header = row![
        text(header_text(snapshot)).size(24),
        container(text(format!("Build {}", snapshot.build)).size(12))
            .padding([2, 8])
            .style(container::rounded_box),
    ]
    .spacing(16)
    .align_y(Alignment::Center);

    // the reduced schema has no session fields
    if variant == Variant::Primary {
        header = header.push(text(session_line(snapshot)).size(18));
    }
    header.into()
}

fn penalty_dialog(pending: &PendingPenalty) -> Element<'_, Message> {
    let verb = if pending.action.is_lap_correction() {
        "Lap correction"
    } else {
        "Penalty"
    };
    let body = column![
        text(format!("{verb} {} for {}", pending.action, pending.driver_name)).size(18),
        text("Optionally note why the command is being issued.").size(13),
        text_input(DEFAULT_REASON, &pending.reason)
            .on_input(Message::ReasonChanged)
            .on_submit(Message::ConfirmPenalty)
            .padding(6),
        row![
            button("Cancel").on_press(Message::CancelPenalty).padding(8),
            button("Assign").on_press(Message::ConfirmPenalty).padding(8),
        ]
        .spacing(10),
    ]
    .spacing(8);

    container(body)
        .padding(12)
        .width(Length::Fixed(480.0))
        .style(container::bordered_box)
        .into()
}

async fn fetch_status(client: RaceControlClient) -> Result<StatusSnapshot, String> {
    client.fetch_status().await.map_err(|e| e.to_string())
}

async fn send_penalty(client: RaceControlClient, command: PenaltyCommand) -> Result<(), String> {
    client.send_penalty(&command).await.map_err(|e| e.to_string())
}
