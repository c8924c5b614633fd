use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use ridesmarter::{
    Booking, BookingLedger, BookingStatus, FareEngine, FareFormula, FareSettings, RideType, VehicleType,
};
use std::io;

/// Sample distances shown in the fare matrix
const CITY_SAMPLE_KM: [u32; 4] = [3, 6, 12, 18];
const INTERCITY_SAMPLE_KM: [u32; 4] = [190, 300, 390, 545];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Bookings,
    FareSettings,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Bookings => Page::FareSettings,
            Page::FareSettings => Page::Bookings,
        }
    }
}

/// One editable number on the fare settings page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormulaField {
    pub ride_type: RideType,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    BaseRate,
    PerKm,
    Multiplier(VehicleType),
}

impl FormulaField {
    pub fn all() -> Vec<FormulaField> {
        let mut fields = Vec::new();
        for ride_type in [RideType::City, RideType::Intercity] {
            fields.push(FormulaField { ride_type, kind: FieldKind::BaseRate });
            fields.push(FormulaField { ride_type, kind: FieldKind::PerKm });
            for vehicle in VehicleType::ALL {
                fields.push(FormulaField { ride_type, kind: FieldKind::Multiplier(vehicle) });
            }
        }
        fields
    }

    pub fn label(&self) -> String {
        let ride = match self.ride_type {
            RideType::City => "City",
            RideType::Intercity => "Intercity",
        };
        match self.kind {
            FieldKind::BaseRate => format!("{} base rate (€)", ride),
            FieldKind::PerKm => format!("{} per km (€)", ride),
            FieldKind::Multiplier(vehicle) => format!("{} {} multiplier", ride, vehicle),
        }
    }

    /// Step used by +/- (matches the admin form inputs)
    pub fn step(&self) -> f64 {
        match self.kind {
            FieldKind::BaseRate | FieldKind::PerKm => 0.01,
            FieldKind::Multiplier(_) => 0.1,
        }
    }

    fn slot<'a>(&self, formula: &'a mut FareFormula) -> &'a mut f64 {
        let card = match self.ride_type {
            RideType::City => &mut formula.city_ride,
            RideType::Intercity => &mut formula.intercity_ride,
        };
        match self.kind {
            FieldKind::BaseRate => &mut card.base_rate,
            FieldKind::PerKm => &mut card.per_km,
            FieldKind::Multiplier(VehicleType::Sedan) => &mut card.sedan,
            FieldKind::Multiplier(VehicleType::Suv) => &mut card.suv,
            FieldKind::Multiplier(VehicleType::Luxury) => &mut card.luxury,
        }
    }

    pub fn value(&self, formula: &FareFormula) -> f64 {
        let mut copy = *formula;
        *self.slot(&mut copy)
    }
}

pub struct App {
    pub engine: FareEngine,
    pub settings: FareSettings,
    pub bookings: Vec<Booking>,
    pub ledger: BookingLedger,
    pub state: TableState,
    pub current_page: Page,
    pub show_detail: bool,
    pub fields: Vec<FormulaField>,
    pub field_state: TableState,
    pub draft: FareFormula,
    pub message: Option<(String, Color)>,
}

impl App {
    pub fn new(engine: FareEngine, settings: FareSettings, ledger: BookingLedger) -> Self {
        let bookings = ledger.all();
        let mut state = TableState::default();
        if !bookings.is_empty() {
            state.select(Some(0));
        }

        let mut field_state = TableState::default();
        field_state.select(Some(0));

        let mut engine = engine;
        engine.set_formula(settings.formula());
        let draft = settings.formula();

        Self {
            engine,
            settings,
            bookings,
            ledger,
            state,
            current_page: Page::Bookings,
            show_detail: false,
            fields: FormulaField::all(),
            field_state,
            draft,
            message: None,
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_booking(&self) -> Option<&Booking> {
        self.state.selected().and_then(|i| self.bookings.get(i))
    }

    pub fn selected_field(&self) -> Option<FormulaField> {
        self.field_state.selected().and_then(|i| self.fields.get(i)).copied()
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn next(&mut self) {
        let (len, state) = self.active_list();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let (len, state) = self.active_list();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    fn active_list(&mut self) -> (usize, &mut TableState) {
        match self.current_page {
            Page::Bookings => (self.bookings.len(), &mut self.state),
            Page::FareSettings => (self.fields.len(), &mut self.field_state),
        }
    }

    /// Nudge the selected draft value by one step in `direction` (+1 / -1)
    pub fn adjust_selected(&mut self, direction: f64) {
        if let Some(field) = self.selected_field() {
            let slot = field.slot(&mut self.draft);
            let next = ((*slot + direction * field.step()) * 100.0).round() / 100.0;
            *slot = next.max(0.0);
            self.message = None;
        }
    }

    /// Validate the draft and make it the active formula
    pub fn save_draft(&mut self) {
        match self.settings.update(self.draft) {
            Ok(revision) => {
                self.engine.set_formula(revision.formula);
                self.message = Some((
                    format!("Fare formulas saved (revision {})", revision.version),
                    Color::Green,
                ));
            }
            Err(errors) => {
                let text: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                self.message = Some((text.join("; "), Color::Red));
            }
        }
    }

    pub fn reset_formula(&mut self) {
        let revision = self.settings.reset();
        self.engine.set_formula(revision.formula);
        self.draft = revision.formula;
        self.message = Some(("Fare formulas reset to defaults".to_string(), Color::Yellow));
    }

    pub fn discard_draft(&mut self) {
        self.draft = self.settings.formula();
        self.message = None;
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
                KeyCode::Tab => app.next_page(),
                KeyCode::Enter if app.current_page == Page::Bookings => app.toggle_detail(),
                KeyCode::Char('+') | KeyCode::Right if app.current_page == Page::FareSettings => {
                    app.adjust_selected(1.0)
                }
                KeyCode::Char('-') | KeyCode::Left if app.current_page == Page::FareSettings => {
                    app.adjust_selected(-1.0)
                }
                KeyCode::Char('s') if app.current_page == Page::FareSettings => app.save_draft(),
                KeyCode::Char('r') if app.current_page == Page::FareSettings => app.reset_formula(),
                KeyCode::Char('u') if app.current_page == Page::FareSettings => app.discard_draft(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Bookings if app.show_detail => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);

            render_bookings(f, content_chunks[0], app);
            render_detail_panel(f, content_chunks[1], app);
        }
        Page::Bookings => render_bookings(f, chunks[1], app),
        Page::FareSettings => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
                .split(chunks[1]);

            render_formula_fields(f, content_chunks[0], app);
            render_fare_matrix(f, content_chunks[1], app);
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let summary = app.ledger.summary();

    let pages = [(Page::Bookings, "Bookings"), (Page::FareSettings, "Fare Settings")];

    let mut tab_spans = vec![];
    for (i, (page, name)) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(*name, style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Bookings: {}", summary.total_bookings),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Revenue: €{:.2}", summary.total_revenue),
        Style::default().fg(Color::Green),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Pending: {}", summary.pending),
        Style::default().fg(Color::Yellow),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Formula v{}", app.settings.current().version),
        Style::default().fg(Color::Cyan),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn status_color(status: BookingStatus) -> Color {
    match status {
        BookingStatus::Completed => Color::Green,
        BookingStatus::Confirmed => Color::Blue,
        BookingStatus::Pending => Color::Yellow,
    }
}

fn render_bookings(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["ID", "Passenger", "Route", "Date", "Vehicle", "Fare", "Status"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.bookings.iter().map(|b| {
        let cells = vec![
            Cell::from(b.id.clone()),
            Cell::from(truncate(&b.passenger_name(), 20)),
            Cell::from(truncate(&format!("{} → {}", b.pickup, b.dropoff), 40)),
            Cell::from(format!("{} {}", b.date, b.time)),
            Cell::from(b.vehicle_type.display_name()),
            Cell::from(format!("€{:.2}", b.fare)),
            Cell::from(b.status.as_str()).style(Style::default().fg(status_color(b.status))),
        ];
        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(9),
            Constraint::Length(22),
            Constraint::Length(42),
            Constraint::Length(18),
            Constraint::Length(9),
            Constraint::Length(11),
            Constraint::Length(11),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Recent Bookings "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let lines = match app.selected_booking() {
        Some(b) => {
            let mut lines = vec![
                Line::from(vec![Span::styled("Booking ID: ", label), Span::raw(b.id.clone())]),
                Line::from(vec![
                    Span::styled("Status:     ", label),
                    Span::styled(b.status.as_str(), Style::default().fg(status_color(b.status))),
                ]),
                Line::from(""),
                Line::from(vec![Span::styled("Passenger:  ", label), Span::raw(b.passenger_name())]),
                Line::from(vec![Span::styled("Email:      ", label), Span::raw(b.email.clone())]),
                Line::from(vec![Span::styled("Phone:      ", label), Span::raw(b.phone.clone())]),
                Line::from(""),
                Line::from(vec![Span::styled("Pickup:     ", label), Span::raw(b.pickup.clone())]),
                Line::from(vec![Span::styled("Dropoff:    ", label), Span::raw(b.dropoff.clone())]),
                Line::from(vec![
                    Span::styled("When:       ", label),
                    Span::raw(format!("{} at {}", b.date, b.time)),
                ]),
                Line::from(vec![
                    Span::styled("Passengers: ", label),
                    Span::raw(b.passengers.to_string()),
                ]),
                Line::from(vec![
                    Span::styled("Vehicle:    ", label),
                    Span::raw(b.vehicle_type.display_name()),
                ]),
                Line::from(vec![Span::styled("Fare:       ", label), Span::raw(format!("€{:.2}", b.fare))]),
            ];
            if let Some(requests) = &b.special_requests {
                lines.push(Line::from(""));
                lines.push(Line::from(vec![Span::styled("Requests:   ", label), Span::raw(requests.clone())]));
            }
            lines
        }
        None => vec![Line::from("No booking selected")],
    };

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Booking Details "),
    );

    f.render_widget(panel, area);
}

fn render_formula_fields(f: &mut Frame, area: Rect, app: &mut App) {
    let active = app.settings.formula();

    let header = Row::new(["Field", "Draft", "Active"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }))
    .style(Style::default().bg(Color::DarkGray));

    let rows: Vec<Row> = app
        .fields
        .iter()
        .map(|field| {
            let draft = field.value(&app.draft);
            let current = field.value(&active);
            let draft_style = if (draft - current).abs() > f64::EPSILON {
                Style::default().fg(Color::Magenta)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(field.label()),
                Cell::from(format!("{:.2}", draft)).style(draft_style),
                Cell::from(format!("{:.2}", current)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [Constraint::Length(30), Constraint::Length(9), Constraint::Length(9)],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Fare Formulas "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.field_state);
}

fn render_fare_matrix(f: &mut Frame, area: Rect, app: &App) {
    let mut lines = vec![];

    for (ride_type, samples) in [(RideType::City, CITY_SAMPLE_KM), (RideType::Intercity, INTERCITY_SAMPLE_KM)] {
        lines.push(Line::from(Span::styled(
            format!("{} rides", ride_type),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));

        let mut heading = format!("{:>10}", "km");
        for vehicle in VehicleType::ALL {
            heading.push_str(&format!("{:>12}", vehicle.display_name()));
        }
        lines.push(Line::from(Span::styled(heading, Style::default().fg(Color::Yellow))));

        for km in samples {
            let mut row = format!("{:>10}", km);
            for vehicle in VehicleType::ALL {
                let fare = app.engine.compute_fare(km, vehicle, ride_type);
                row.push_str(&format!("{:>12}", format!("€{:.2}", fare)));
            }
            lines.push(Line::from(row));
        }
        lines.push(Line::from(""));
    }

    if let Some((message, color)) = &app.message {
        lines.push(Line::from(Span::styled(message.clone(), Style::default().fg(*color))));
    }

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Active Fares "),
    );

    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let key = Style::default().fg(Color::Yellow);

    let mut status_spans = vec![];
    match app.current_page {
        Page::Bookings => {
            let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
            status_spans.push(Span::styled(
                format!(" Row: {}/{} ", selected, app.bookings.len()),
                Style::default().fg(Color::Cyan),
            ));
            status_spans.push(Span::raw(" | "));
            status_spans.push(Span::styled("Enter", key));
            status_spans.push(Span::raw(" Details | "));
        }
        Page::FareSettings => {
            status_spans.push(Span::styled("+/-", key));
            status_spans.push(Span::raw(" Adjust | "));
            status_spans.push(Span::styled("s", key));
            status_spans.push(Span::raw(" Save | "));
            status_spans.push(Span::styled("u", key));
            status_spans.push(Span::raw(" Undo | "));
            status_spans.push(Span::styled("r", key));
            status_spans.push(Span::raw(" Reset | "));
        }
    }

    status_spans.push(Span::styled("Tab", key));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("↑/↓", key));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::new(FareEngine::default(), FareSettings::default(), BookingLedger::with_demo_bookings())
    }

    #[test]
    fn test_ten_formula_fields() {
        let fields = FormulaField::all();
        assert_eq!(fields.len(), 10);
        assert_eq!(fields[0].label(), "City base rate (€)");
        assert_eq!(fields[9].label(), "Intercity Luxury multiplier");
    }

    #[test]
    fn test_adjust_and_save() {
        let mut app = app();
        app.current_page = Page::FareSettings;
        app.adjust_selected(1.0);
        assert!((app.draft.city_ride.base_rate - 5.01).abs() < 1e-9);
        assert_eq!(app.settings.formula().city_ride.base_rate, 5.0);

        app.save_draft();
        assert_eq!(app.settings.current().version, 2);
        assert!((app.engine.formula().city_ride.base_rate - 5.01).abs() < 1e-9);
    }

    #[test]
    fn test_multiplier_below_minimum_not_saved() {
        let mut app = app();
        app.current_page = Page::FareSettings;
        // City sedan multiplier
        app.field_state.select(Some(2));
        for _ in 0..10 {
            app.adjust_selected(-1.0);
        }
        assert_eq!(app.draft.city_ride.sedan, 0.0);

        app.save_draft();
        assert_eq!(app.settings.current().version, 1);
        assert!(matches!(app.message, Some((_, Color::Red))));
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = app();
        app.previous();
        assert_eq!(app.state.selected(), Some(2));
        app.next();
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Frankfurt", 20), "Frankfurt");
        assert_eq!(truncate("Frankfurt Sachsenhausen", 10), "Frankfu...");
    }
}
