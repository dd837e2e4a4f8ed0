use crate::Message;
use iced::widget::{column, container, pick_list, row, text, Column};
use iced::{Alignment, Background, Border, Color, Element, Length, Theme};
use racecore::protocol::{PenaltyAction, Vehicle};
use racecore::view::{pit_distance_text, speed_text, team_name, Badge, RgbColor, VehicleBadges};

const BADGE_WIDTH: f32 = 44.0;

/// Action choices offered in every row.
#[derive(Debug, Clone)]
pub struct ActionMenus {
    penalties: Vec<PenaltyAction>,
    lap_corrections: Vec<PenaltyAction>,
}

impl Default for ActionMenus {
    fn default() -> Self {
        Self {
            penalties: PenaltyAction::penalties(),
            lap_corrections: PenaltyAction::lap_corrections(),
        }
    }
}

pub fn header_row<'a>() -> Element<'a, Message> {
    row![
        cell("Pos", 48.0),
        cell("Team / Driver", 240.0),
        cell("Class", 70.0),
        cell("Penalty", 190.0),
        cell("Lap correction", 120.0),
        cell("Speed", 110.0),
        cell("", BADGE_WIDTH * 6.0),
        cell("Laps", 64.0),
        cell("Stops", 64.0),
        cell("Pit lane", 80.0),
        cell("", BADGE_WIDTH),
    ]
    .spacing(6)
    .into()
}

pub fn vehicle_table<'a>(vehicles: &'a [Vehicle], menus: &'a ActionMenus) -> Element<'a, Message> {
    if vehicles.is_empty() {
        return text("No vehicles on track").size(14).into();
    }
    vehicles
        .iter()
        .fold(Column::new().spacing(4), |col, vehicle| {
            col.push(vehicle_row(vehicle, menus))
        })
        .into()
}

fn vehicle_row<'a>(vehicle: &'a Vehicle, menus: &'a ActionMenus) -> Element<'a, Message> {
    let badges = VehicleBadges::for_vehicle(vehicle);
    let driver = vehicle.driver_name.clone();
    let lap_driver = vehicle.driver_name.clone();

    let identity = column![
        text(team_name(vehicle)).size(14),
        text(&vehicle.driver_name).size(12),
    ]
    .width(Length::Fixed(240.0));

    let penalty_menu = pick_list(&menus.penalties[..], None::<PenaltyAction>, move |action| {
        Message::ActionSelected(driver.clone(), action)
    })
    .placeholder("Penalty")
    .text_size(13)
    .width(Length::Fixed(190.0));

    let lap_menu = pick_list(
        &menus.lap_corrections[..],
        None::<PenaltyAction>,
        move |action| Message::ActionSelected(lap_driver.clone(), action),
    )
    .placeholder("Laps")
    .text_size(13)
    .width(Length::Fixed(120.0));

    let status_badges = row![
        badge_cell(badges.garage.as_ref()),
        badge_cell(badges.pit.as_ref()),
        badge_cell(badges.flag.as_ref()),
        badge_cell(badges.sector.as_ref()),
        badge_cell(badges.penalties.as_ref()),
        badge_cell(badges.pit_transition.as_ref()),
    ];

    row![
        cell(format!("P{}", vehicle.position), 48.0),
        identity,
        cell(vehicle.car_class.clone(), 70.0),
        penalty_menu,
        lap_menu,
        cell(speed_text(vehicle), 110.0),
        status_badges,
        cell(format!("{} laps", vehicle.laps_completed), 64.0),
        cell(format!("{} stops", vehicle.pitstops), 64.0),
        cell(pit_distance_text(vehicle), 80.0),
        badge_cell(badges.finish.as_ref()),
    ]
    .spacing(6)
    .align_y(Alignment::Center)
    .into()
}

fn cell<'a>(content: impl Into<String>, width: f32) -> Element<'a, Message> {
    container(text(content.into()).size(13))
        .width(Length::Fixed(width))
        .into()
}

fn badge_cell<'a>(badge: Option<&Badge>) -> Element<'a, Message> {
    let content: Element<'a, Message> = match badge {
        Some(badge) => {
            let background = to_color(badge.background);
            let foreground = to_color(badge.foreground);
            container(text(badge.label.clone()).size(12).color(foreground))
                .padding([2, 6])
                .style(move |_: &Theme| container::Style {
                    background: Some(Background::Color(background)),
                    text_color: Some(foreground),
                    border: Border {
                        radius: 3.0.into(),
                        ..Border::default()
                    },
                    ..container::Style::default()
                })
                .into()
        }
        None => text("").into(),
    };
    container(content)
        .center_x(Length::Fixed(BADGE_WIDTH))
        .into()
}

fn to_color(rgb: RgbColor) -> Color {
    Color::from_rgb8(rgb.r, rgb.g, rgb.b)
}
