use tracing::{debug, info};

use crate::error::WeatherError;
use crate::weather::{CityLocation, Report};

/// Identifies one lookup. Only the newest ticket may update the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// What the user is looking at. One writer: the UI loop.
#[derive(Debug, Default)]
pub struct Session {
    seq: u64,
    pub loading: bool,
    pub error: Option<String>,
    pub report: Option<Report>,
    pub current_city: Option<CityLocation>,
    /// Text typed into the search box.
    pub input: String,
}

impl Session {
    /// Starts a lookup for `query`. An empty query never leaves the session.
    pub fn begin(&mut self, query: &str) -> Result<(Ticket, String), WeatherError> {
        let query = query.trim();
        if query.is_empty() {
            let err = WeatherError::Query;
            self.error = Some(err.user_message());
            return Err(err);
        }
        Ok((self.next_ticket(), query.to_string()))
    }

    /// Starts a re-fetch for a stored favorite.
    pub fn begin_favorite(&mut self) -> Ticket {
        self.next_ticket()
    }

    fn next_ticket(&mut self) -> Ticket {
        self.seq += 1;
        self.loading = true;
        self.report = None;
        self.error = None;
        Ticket(self.seq)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.seq
    }

    /// Applies a finished lookup. Returns the report when it was accepted.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<Report, WeatherError>,
    ) -> Option<&Report> {
        if !self.is_current(ticket) {
            debug!(ticket = ticket.0, latest = self.seq, "dropping stale lookup");
            return None;
        }

        self.loading = false;
        match result {
            Ok(report) => {
                info!(city = %report.city.name, "lookup finished");
                self.current_city = Some(report.city.clone());
                self.report = Some(report);
                self.report.as_ref()
            }
            Err(err) => {
                info!(error = %err, "lookup failed");
                self.error = Some(err.user_message());
                None
            }
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use crate::weather::fixtures::{report, series};

    #[test]
    fn test_empty_query_sets_error_without_loading() {
        let mut session = Session::default();
        assert!(matches!(session.begin("   "), Err(WeatherError::Query)));
        assert!(!session.loading);
        assert_eq!(session.error.as_deref(), Some("Please enter a city name."));
    }

    #[test]
    fn test_begin_hides_panel_and_clears_error() {
        let mut session = Session {
            error: Some("old".into()),
            ..Session::default()
        };
        let (t, _) = session.begin("Paris").unwrap();
        session.complete(t, Ok(report("Paris", 10, series(&[], &[]))));
        session.error = Some("old".into());

        let (_, query) = session.begin(" Lyon ").unwrap();
        assert_eq!(query, "Lyon");
        assert!(session.loading);
        assert!(session.report.is_none());
        assert!(session.error.is_none());
    }

    #[test]
    fn test_success_records_current_city() {
        let mut session = Session::default();
        let (t, _) = session.begin("Paris").unwrap();
        assert!(session.complete(t, Ok(report("Paris", 10, series(&[], &[])))).is_some());
        assert!(!session.loading);
        assert_eq!(session.current_city.as_ref().map(|c| c.name.as_str()), Some("Paris"));
    }

    #[test]
    fn test_failure_clears_loading_and_shows_message() {
        let mut session = Session::default();
        let (t, _) = session.begin("Paris").unwrap();
        let err = WeatherError::Http {
            stage: Stage::Forecast,
            status: 500,
        };
        assert!(session.complete(t, Err(err)).is_none());
        assert!(!session.loading);
        assert_eq!(session.error.as_deref(), Some("Could not retrieve weather data."));
    }

    #[test]
    fn test_stale_response_is_dropped() {
        let mut session = Session::default();
        let (first, _) = session.begin("Paris").unwrap();
        let second = session.begin_favorite();

        assert!(session
            .complete(first, Ok(report("Paris", 10, series(&[], &[]))))
            .is_none());
        assert!(session.loading);
        assert!(session.report.is_none());

        session.complete(second, Ok(report("Lyon", 10, series(&[], &[]))));
        assert!(!session.loading);
        assert_eq!(session.report.as_ref().map(|r| r.city.name.as_str()), Some("Lyon"));

        // a late failure from the first lookup must not clobber the display
        session.complete(first, Err(WeatherError::NotFound("Paris".into())));
        assert!(session.error.is_none());
        assert!(session.report.is_some());
    }

    #[test]
    fn test_dismiss_error() {
        let mut session = Session::default();
        let _ = session.begin("");
        session.dismiss_error();
        assert!(session.error.is_none());
    }
}
