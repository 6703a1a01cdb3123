use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, BorderType, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table,
    },
    Frame, Terminal,
};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::alerts::AlertEvaluator;
use crate::error::WeatherError;
use crate::notify::{Dispatcher, ToastTray};
use crate::open_meteo::WeatherSource;
use crate::session::{Session, Ticket};
use crate::store::{KeyValueStore, Preferences, Theme};
use crate::view::{self, CardStyle, HourCard, ThemeView, WeatherPanel};
use crate::weather::{CityLocation, Report};

const TICK: Duration = Duration::from_millis(250);

type Outcome = (Ticket, Result<Report, WeatherError>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Editing,
    PermissionPrompt,
}

pub struct App<S> {
    source: Arc<dyn WeatherSource>,
    prefs: Preferences<S>,
    dispatcher: Dispatcher<ToastTray>,
    evaluator: AlertEvaluator,
    session: Session,
    favorites: Vec<CityLocation>,
    favorites_state: ListState,
    theme: Theme,
    mode: Mode,
    tx: Sender<Outcome>,
    rx: Receiver<Outcome>,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(
        source: Arc<dyn WeatherSource>,
        prefs: Preferences<S>,
        dispatcher: Dispatcher<ToastTray>,
        evaluator: AlertEvaluator,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        let favorites = prefs.load_favorites();
        let theme = prefs.load_theme();
        let favorites_state =
            ListState::default().with_selected((!favorites.is_empty()).then_some(0));
        Self {
            source,
            prefs,
            dispatcher,
            evaluator,
            session: Session::default(),
            favorites,
            favorites_state,
            theme,
            mode: Mode::Normal,
            tx,
            rx,
        }
    }

    pub fn search(&mut self, query: &str) {
        let Ok((ticket, query)) = self.session.begin(query) else {
            return;
        };
        info!(%query, "lookup started");
        self.spawn(ticket, move |source| source.lookup(&query));
    }

    pub fn open_favorite(&mut self, idx: usize) {
        let Some(city) = self.favorites.get(idx).cloned() else {
            return;
        };
        let ticket = self.session.begin_favorite();
        info!(city = %city.name, "favorite lookup started");
        self.spawn(ticket, move |source| source.report_for(city));
    }

    fn spawn<F>(&self, ticket: Ticket, job: F)
    where
        F: FnOnce(&dyn WeatherSource) -> Result<Report, WeatherError> + Send + 'static,
    {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = job(source.as_ref());
            // the receiver only goes away on shutdown
            let _ = tx.send((ticket, result));
        });
    }

    /// Applies every lookup that finished since the last call.
    pub fn drain(&mut self) {
        while let Ok((ticket, result)) = self.rx.try_recv() {
            self.apply(ticket, result);
        }
    }

    fn apply(&mut self, ticket: Ticket, result: Result<Report, WeatherError>) {
        let Some(report) = self.session.complete(ticket, result) else {
            return;
        };
        let events = self.evaluator.evaluate(
            &report.forecast.hourly,
            report.forecast.origin_hour(),
            &report.city.name,
        );
        for event in &events {
            info!(kind = event.kind.tag(), value = event.value, city = %event.city, "alert raised");
            self.dispatcher.dispatch(event);
        }
    }

    pub fn add_current_favorite(&mut self) {
        let Some(city) = self.session.current_city.clone() else {
            return;
        };
        match self.prefs.add_favorite(&city) {
            Ok(true) => {
                info!(city = %city.name, "favorite added");
                self.favorites = self.prefs.load_favorites();
                if self.favorites_state.selected().is_none() {
                    self.favorites_state.select(Some(0));
                }
            }
            Ok(false) => {}
            Err(e) => warn!(error = %e, "cannot save favorites"),
        }
    }

    pub fn toggle_theme(&mut self) {
        match self.prefs.toggle_theme() {
            Ok(theme) => self.theme = theme,
            Err(e) => {
                warn!(error = %e, "cannot save theme");
                self.theme = self.theme.toggled();
            }
        }
    }

    pub fn request_notifications(&mut self) {
        if self.dispatcher.needs_prompt() {
            self.mode = Mode::PermissionPrompt;
        }
    }

    fn answer_prompt(&mut self, granted: Option<bool>) {
        self.mode = Mode::Normal;
        let Some(granted) = granted else {
            return;
        };
        let permission = self.dispatcher.request_permission(granted);
        if let Err(e) = permission.save(self.prefs.store_mut()) {
            warn!(error = %e, "cannot save notification permission");
        }
    }

    fn select_favorite(&mut self, delta: isize) {
        if self.favorites.is_empty() {
            return;
        }
        let len = self.favorites.len() as isize;
        let current = self.favorites_state.selected().unwrap_or(0) as isize;
        self.favorites_state
            .select(Some((current + delta).rem_euclid(len) as usize));
    }

    /// Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        match self.mode {
            Mode::Editing => match key.code {
                KeyCode::Enter => {
                    self.mode = Mode::Normal;
                    let query = self.session.input.clone();
                    self.search(&query);
                }
                KeyCode::Esc => self.mode = Mode::Normal,
                KeyCode::Backspace => {
                    self.session.input.pop();
                }
                KeyCode::Char(c) => self.session.input.push(c),
                _ => {}
            },
            Mode::PermissionPrompt => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.answer_prompt(Some(true)),
                KeyCode::Char('n') | KeyCode::Char('N') => self.answer_prompt(Some(false)),
                KeyCode::Esc => self.answer_prompt(None),
                _ => {}
            },
            Mode::Normal => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return true,
                KeyCode::Char('/') | KeyCode::Char('s') => self.mode = Mode::Editing,
                KeyCode::Char('f') => self.add_current_favorite(),
                KeyCode::Char('t') => self.toggle_theme(),
                KeyCode::Char('n') => self.request_notifications(),
                KeyCode::Char('x') => self.session.dismiss_error(),
                KeyCode::Up => self.select_favorite(-1),
                KeyCode::Down => self.select_favorite(1),
                KeyCode::Enter => {
                    if let Some(idx) = self.favorites_state.selected() {
                        self.open_favorite(idx);
                    }
                }
                _ => {}
            },
        }
        false
    }

    pub fn tick(&mut self) {
        self.dispatcher.sink_mut().expire(Instant::now());
    }
}

pub fn run_app<B: Backend, S: KeyValueStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key(key) {
                    return Ok(());
                }
            }
        }

        app.drain();
        app.tick();
    }
}

struct Palette {
    base: Style,
    border: Color,
    title: Color,
    value: Color,
    muted: Color,
}

impl Palette {
    fn for_theme(theme: ThemeView) -> Self {
        if theme.dark {
            Self {
                base: Style::default().fg(Color::Gray).bg(Color::Black),
                border: Color::Cyan,
                title: Color::Yellow,
                value: Color::Green,
                muted: Color::DarkGray,
            }
        } else {
            Self {
                base: Style::default().fg(Color::Black).bg(Color::White),
                border: Color::Blue,
                title: Color::Magenta,
                value: Color::Rgb(0, 110, 0),
                muted: Color::Gray,
            }
        }
    }

    fn block<'a>(&self, title: &'a str) -> Block<'a> {
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(title, Style::default().fg(self.title)))
            .title_alignment(Alignment::Left)
            .border_style(Style::default().fg(self.border))
            .border_type(BorderType::Rounded)
    }
}

fn display_headline<'a>(
    palette: &Palette,
    theme: ThemeView,
    notify: view::NotifyButton,
) -> Paragraph<'a> {
    let notify_style = if notify.enabled {
        Style::default().fg(palette.value)
    } else {
        Style::default().fg(palette.muted)
    };
    Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(
            "meteo",
            Style::default().fg(palette.title).add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled(format!("[t] {}", theme.toggle_glyph), Style::default().fg(palette.value)),
        Span::raw("   "),
        Span::styled(format!("[n] {}", notify.label), notify_style),
    ]))
    .block(palette.block(""))
}

fn display_search<'a>(palette: &Palette, input: &'a str, editing: bool) -> Paragraph<'a> {
    let text = if input.is_empty() && !editing {
        Span::styled(" press / to search for a city", Style::default().fg(palette.muted))
    } else {
        Span::raw(format!(" {input}"))
    };
    let mut block = palette.block(" Search ");
    if editing {
        block = block.border_style(Style::default().fg(palette.title));
    }
    Paragraph::new(Line::from(text)).block(block)
}

fn display_current_conditions<'a>(palette: &Palette, panel: &WeatherPanel) -> Table<'a> {
    let value = Style::default().fg(palette.value);
    let rows = vec![
        Row::new(vec![Cell::from("")]),
        Row::new(vec![
            Cell::from(" Temperature"),
            Cell::from(format!("{} °C {}", panel.temperature, panel.glyph)).style(value),
        ]),
        Row::new(vec![Cell::from(" Feels like"), Cell::from(panel.feels_like.clone()).style(value)]),
        Row::new(vec![Cell::from(" Wind"), Cell::from(panel.wind.clone()).style(value)]),
        Row::new(vec![Cell::from(" Humidity"), Cell::from(panel.humidity.clone()).style(value)]),
    ];

    Table::new(rows, [Constraint::Length(13), Constraint::Min(10)])
        .block(palette.block(" Current Conditions ").title(Span::styled(
            format!(" {} ", panel.city),
            Style::default().fg(palette.value).add_modifier(Modifier::BOLD),
        )))
}

fn display_hour<'a>(palette: &Palette, card: &HourCard) -> Paragraph<'a> {
    let border = match card.style {
        CardStyle::Rain => Color::LightBlue,
        CardStyle::Warm => Color::LightRed,
        CardStyle::Neutral => palette.border,
    };
    let border_type = match card.style {
        CardStyle::Neutral => BorderType::Rounded,
        CardStyle::Rain | CardStyle::Warm => BorderType::Thick,
    };
    Paragraph::new(vec![
        Line::from(Span::styled(
            card.label.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(card.glyph),
        Line::from(Span::styled(
            card.temperature.clone(),
            Style::default().fg(palette.value).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            card.precipitation.clone().unwrap_or_default(),
            Style::default().fg(palette.muted),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(border_type)
            .border_style(Style::default().fg(border)),
    )
}

fn display_weather<S>(f: &mut Frame, area: Rect, palette: &Palette, app: &App<S>) {
    let panel = match &app.session.report {
        Some(report) => view::weather_panel(report, &app.evaluator),
        None => {
            let text = if app.session.loading {
                " Loading…"
            } else {
                " No city selected"
            };
            let placeholder = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(text, Style::default().fg(palette.muted))),
            ])
            .block(palette.block(" Weather "));
            f.render_widget(placeholder, area);
            return;
        }
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Length(8), Constraint::Min(0)])
        .split(area);
    f.render_widget(display_current_conditions(palette, &panel), chunks[0]);

    let hourly_block = palette.block(" Next hours ");
    let inner = hourly_block.inner(chunks[1]);
    f.render_widget(hourly_block, chunks[1]);
    if panel.hours.is_empty() {
        f.render_widget(
            Paragraph::new(Span::styled(" --", Style::default().fg(palette.muted))),
            inner,
        );
        return;
    }
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, panel.hours.len() as u32); panel.hours.len()])
        .split(inner);
    for (card, column) in panel.hours.iter().zip(columns.iter()) {
        f.render_widget(display_hour(palette, card), *column);
    }
}

fn display_toasts(f: &mut Frame, palette: &Palette, tray: &ToastTray) {
    let area = f.area();
    let width = 44.min(area.width);
    let mut y = area.height.saturating_sub(1);
    for toast in tray.toasts().iter().rev() {
        let height = 4;
        if y < height + 1 {
            break;
        }
        y -= height;
        let rect = Rect::new(area.width.saturating_sub(width + 1), y, width, height);
        let widget = Paragraph::new(vec![
            Line::from(Span::styled(
                toast.notification.title.clone(),
                Style::default().fg(palette.title).add_modifier(Modifier::BOLD),
            )),
            Line::from(toast.notification.body.clone()),
        ])
        .style(palette.base)
        .block(palette.block(""));
        f.render_widget(Clear, rect);
        f.render_widget(widget, rect);
    }
}

fn display_prompt(f: &mut Frame, palette: &Palette) {
    let area = f.area();
    let width = 46.min(area.width);
    let height = 5.min(area.height);
    let rect = Rect::new(
        (area.width - width) / 2,
        (area.height - height) / 2,
        width,
        height,
    );
    let widget = Paragraph::new(vec![
        Line::from(" Allow meteo to show weather alerts?"),
        Line::from(""),
        Line::from(Span::styled(
            " [y] allow   [n] block   [esc] not now",
            Style::default().fg(palette.value),
        )),
    ])
    .style(palette.base)
    .block(palette.block(" Notifications "));
    f.render_widget(Clear, rect);
    f.render_widget(widget, rect);
}

fn ui<S>(f: &mut Frame, app: &mut App<S>) {
    let theme = view::theme_view(app.theme);
    let palette = Palette::for_theme(theme);
    f.render_widget(Block::default().style(palette.base), f.area());

    let error_height = if app.session.error.is_some() { 1 } else { 0 };
    let vert_layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(error_height),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    let notify = view::notify_button(app.dispatcher.permission());
    f.render_widget(display_headline(&palette, theme, notify), vert_layout[0]);

    let editing = app.mode == Mode::Editing;
    f.render_widget(display_search(&palette, &app.session.input, editing), vert_layout[1]);
    if editing {
        let x = vert_layout[1].x + 2 + app.session.input.chars().count() as u16;
        f.set_cursor_position((x, vert_layout[1].y + 1));
    }

    if let Some(ref message) = app.session.error {
        f.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(format!(" ⚠ {message}"), Style::default().fg(Color::Red)),
                Span::styled("  [x] dismiss", Style::default().fg(palette.muted)),
            ])),
            vert_layout[2],
        );
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)].as_ref())
        .split(vert_layout[3]);

    display_weather(f, chunks[0], &palette, app);

    let entries = view::favorites_panel(&app.favorites, app.favorites_state.selected());
    let list_items: Vec<ListItem> = if entries.is_empty() {
        vec![ListItem::new(Span::styled(
            "  [f] saves the current city",
            Style::default().fg(palette.muted),
        ))]
    } else {
        entries
            .into_iter()
            .map(|entry| {
                let marker = if entry.selected { "›" } else { " " };
                ListItem::new(format!("{marker} {}", entry.label))
            })
            .collect()
    };
    let favorites = List::new(list_items)
        .block(palette.block(" Favorites "))
        .highlight_style(Style::default().fg(palette.value).add_modifier(Modifier::BOLD));
    f.render_stateful_widget(favorites, chunks[1], &mut app.favorites_state);

    f.render_widget(
        Paragraph::new(Span::styled(
            " / search   enter open favorite   f save   t theme   n notifications   q quit",
            Style::default().fg(palette.muted),
        )),
        vert_layout[4],
    );

    display_toasts(f, &palette, app.dispatcher.sink());
    if app.mode == Mode::PermissionPrompt {
        display_prompt(f, &palette);
    }
}
