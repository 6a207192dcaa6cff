//! Client-side state of the paginated ride list.
//!
//! The view owns the current [`Pagination`]. Every change issues a
//! [`FetchTicket`]; only the result for the most recently issued ticket is
//! applied, whatever order results arrive in. Rows from the last good page
//! stay in place while loading and after a failure.

use tracing::{debug, warn};

use crate::{
    error::AppError,
    models::{pagination::Pagination, ride::Ride, ride::RidePage},
};

use super::{
    columns,
    session::SessionHandle,
    source::{RideSource, SourceError},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListStatus {
    Idle,
    Loading,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    pagination: Pagination,
}

impl FetchTicket {
    pub fn pagination(&self) -> Pagination {
        self.pagination
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// A newer ticket was issued; the result was dropped.
    Stale,
    Failed,
    SessionLost,
}

pub struct RideListView<S> {
    source: S,
    session: SessionHandle,
    pagination: Pagination,
    rides: Vec<Ride>,
    rows: Vec<Vec<String>>,
    total: Option<i64>,
    status: ListStatus,
    issued: u64,
}

impl<S: RideSource> RideListView<S> {
    pub fn new(source: S, session: SessionHandle, page_size: u32) -> Result<Self, AppError> {
        Ok(Self {
            source,
            session,
            pagination: Pagination::new(0, page_size)?,
            rides: Vec::new(),
            rows: Vec::new(),
            total: None,
            status: ListStatus::Idle,
            issued: 0,
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn headers(&self) -> Vec<&'static str> {
        columns::headers()
    }

    pub fn rides(&self) -> &[Ride] {
        &self.rides
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Advisory only; the server reports an estimate.
    pub fn total_hint(&self) -> Option<i64> {
        self.total
    }

    pub fn status(&self) -> &ListStatus {
        &self.status
    }

    pub fn can_previous(&self) -> bool {
        self.pagination.page_index() > 0
    }

    /// A short page means the end of the history was reached.
    pub fn can_next(&self) -> bool {
        self.rides.len() >= self.pagination.page_size() as usize
    }

    pub fn next_page(&mut self) -> Option<FetchTicket> {
        if !self.can_next() {
            return None;
        }
        self.pagination = self.pagination.next();
        Some(self.begin())
    }

    pub fn previous_page(&mut self) -> Option<FetchTicket> {
        if !self.can_previous() {
            return None;
        }
        self.pagination = self.pagination.previous();
        Some(self.begin())
    }

    pub fn set_page_size(&mut self, page_size: u32) -> Result<FetchTicket, AppError> {
        self.pagination = self.pagination.with_page_size(page_size)?;
        Ok(self.begin())
    }

    /// Issues a ticket for the current pagination; earlier tickets become
    /// stale.
    pub fn begin(&mut self) -> FetchTicket {
        self.issued += 1;
        self.status = ListStatus::Loading;
        FetchTicket {
            seq: self.issued,
            pagination: self.pagination,
        }
    }

    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<RidePage, SourceError>,
    ) -> Outcome {
        if ticket.seq != self.issued {
            debug!(
                seq = ticket.seq,
                latest = self.issued,
                "dropping superseded rides page"
            );
            return Outcome::Stale;
        }

        match result {
            Ok(page) => {
                self.rows = page.rides.iter().map(columns::render_row).collect();
                self.rides = page.rides;
                self.total = Some(page.total);
                self.status = ListStatus::Idle;
                Outcome::Applied
            }
            Err(SourceError::Unauthorized) => {
                self.status = ListStatus::Failed(SourceError::Unauthorized.to_string());
                self.session.clear();
                Outcome::SessionLost
            }
            Err(err) => {
                warn!(page = ticket.pagination.page_index(), "rides page failed: {err}");
                self.status = ListStatus::Failed(err.to_string());
                Outcome::Failed
            }
        }
    }

    /// Fetches the current page and applies it.
    pub async fn load(&mut self) -> Outcome {
        let ticket = self.begin();
        self.run(ticket).await
    }

    pub async fn run(&mut self, ticket: FetchTicket) -> Outcome {
        let result = self.source.fetch_page(ticket.pagination).await;
        self.complete(ticket, result)
    }

    pub async fn sign_out(&mut self) -> Result<(), SourceError> {
        let result = self.source.sign_out().await;
        self.session.clear();
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::dashboard::session::{session_channel, Navigation, SessionToken};
    use crate::models::ride::RideStatus;

    #[derive(Clone, Default)]
    struct FakeSource {
        total: i64,
        fail_with: Arc<Mutex<Option<SourceError>>>,
        signed_out: Arc<Mutex<bool>>,
    }

    impl FakeSource {
        fn with_total(total: i64) -> Self {
            Self {
                total,
                ..Self::default()
            }
        }

        fn fail_next(&self, err: SourceError) {
            *self.fail_with.lock().unwrap() = Some(err);
        }

        fn page(&self, pagination: Pagination) -> RidePage {
            let start = self.total - pagination.offset();
            let rides = (0..pagination.limit())
                .map(|i| start - i)
                .take_while(|id| *id > 0)
                .map(ride)
                .collect();
            RidePage {
                rides,
                total: self.total,
            }
        }
    }

    #[async_trait]
    impl RideSource for FakeSource {
        async fn fetch_page(&self, pagination: Pagination) -> Result<RidePage, SourceError> {
            if let Some(err) = self.fail_with.lock().unwrap().take() {
                return Err(err);
            }
            Ok(self.page(pagination))
        }

        async fn sign_out(&self) -> Result<(), SourceError> {
            *self.signed_out.lock().unwrap() = true;
            Ok(())
        }
    }

    fn ride(id: i64) -> Ride {
        Ride {
            id,
            request_time: None,
            start_time: None,
            end_time: None,
            gender: None,
            affiliate_id: None,
            status: RideStatus::Completed,
            passengers: None,
            drivers: None,
        }
    }

    fn view(total: i64, page_size: u32) -> (RideListView<FakeSource>, SessionHandle) {
        let (handle, _watch) = session_channel(Some(SessionToken("rides_session=x".into())));
        let view = RideListView::new(FakeSource::with_total(total), handle.clone(), page_size).unwrap();
        (view, handle)
    }

    fn ids(view: &RideListView<FakeSource>) -> Vec<i64> {
        view.rides().iter().map(|r| r.id).collect()
    }

    #[tokio::test]
    async fn pages_forward_and_back() {
        let (mut view, _) = view(25, 10);
        assert_eq!(view.load().await, Outcome::Applied);
        assert_eq!(ids(&view)[..3].to_vec(), vec![25, 24, 23]);
        assert!(!view.can_previous());
        assert!(view.previous_page().is_none());

        let ticket = view.next_page().unwrap();
        assert_eq!(view.run(ticket).await, Outcome::Applied);
        assert_eq!(ids(&view).first(), Some(&15));

        let ticket = view.next_page().unwrap();
        view.run(ticket).await;
        assert_eq!(ids(&view), vec![5, 4, 3, 2, 1]);
        assert!(!view.can_next());
        assert!(view.next_page().is_none());

        let ticket = view.previous_page().unwrap();
        assert_eq!(ticket.pagination().page_index(), 1);
        view.run(ticket).await;
        assert_eq!(view.rows().len(), 10);
        assert_eq!(view.total_hint(), Some(25));
    }

    #[test]
    fn stale_results_are_dropped() {
        let (mut view, _) = view(100, 10);
        let source = view.source().clone();
        let first = view.begin();
        view.complete(first, Ok(source.page(first.pagination())));

        let older = view.next_page().unwrap();
        let newer = view.next_page().unwrap();
        assert_eq!(newer.pagination().page_index(), 2);

        assert_eq!(
            view.complete(newer, Ok(source.page(newer.pagination()))),
            Outcome::Applied
        );
        assert_eq!(
            view.complete(older, Ok(source.page(older.pagination()))),
            Outcome::Stale
        );
        assert_eq!(ids(&view).first(), Some(&80));
        assert_eq!(view.pagination().page_index(), 2);
    }

    #[tokio::test]
    async fn rows_survive_loading_and_errors() {
        let (mut view, _) = view(30, 10);
        view.load().await;
        let before = view.rows().to_vec();

        let ticket = view.next_page().unwrap();
        assert_eq!(view.status(), &ListStatus::Loading);
        assert_eq!(view.rows(), before.as_slice());

        view.source().fail_next(SourceError::Server {
            status: 500,
            message: "connection reset".into(),
        });
        assert_eq!(view.run(ticket).await, Outcome::Failed);
        assert_eq!(view.rows(), before.as_slice());
        assert!(matches!(view.status(), ListStatus::Failed(msg) if msg.contains("connection reset")));
    }

    #[tokio::test]
    async fn unauthorized_clears_the_session() {
        let (mut view, handle) = view(30, 10);
        let mut watch = handle.watch();
        assert_eq!(watch.check(), None);

        view.source().fail_next(SourceError::Unauthorized);
        assert_eq!(view.load().await, Outcome::SessionLost);
        assert_eq!(watch.check(), Some(Navigation::Redirect("/")));
    }

    #[tokio::test]
    async fn sign_out_redirects_to_entry_point() {
        let (mut view, handle) = view(30, 10);
        let mut watch = handle.watch();
        assert_eq!(watch.check(), None);

        view.sign_out().await.unwrap();
        assert!(*view.source().signed_out.lock().unwrap());
        assert_eq!(watch.check(), Some(Navigation::Redirect("/")));
    }

    #[test]
    fn page_size_change_restarts_at_first_page() {
        let (mut view, _) = view(30, 10);
        let source = view.source().clone();
        let first = view.begin();
        view.complete(first, Ok(source.page(first.pagination())));
        let _ = view.next_page().unwrap();

        let ticket = view.set_page_size(5).unwrap();
        assert_eq!(ticket.pagination(), Pagination::new(0, 5).unwrap());
        assert!(view.set_page_size(0).is_err());
    }
}
