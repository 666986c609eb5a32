//! Pagination and filter state, as a pure reducer.
//!
//! The state separates what is on screen (the *committed* query, page count and total) from
//! what the operator last asked for (the *pending* request). Navigation and filter changes only
//! build a new request; the committed query moves when the matching response arrives. Every
//! fetch carries a sequence number and only the most recently issued one may commit, so a slow
//! response to a superseded request can never overwrite newer data.

use registro_types::{ListQuery, NonEmptyText, PatientFilters};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewEvent {
    RiskFilterChanged(Option<NonEmptyText>),
    NameFilterChanged(Option<NonEmptyText>),
    PageSizeChanged(u32),
    PrevPage,
    NextPage,
    /// Refetch the current intent as-is (initial load, after a mutation).
    Reload,
    ListLoaded {
        seq: u64,
        page: u32,
        pages: u32,
        total: u64,
    },
    ListFailed {
        seq: u64,
    },
    StatsRequested,
    StatsLoaded {
        seq: u64,
    },
}

/// A list fetch the host must perform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListRequest {
    pub seq: u64,
    pub query: ListQuery,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fetch {
    List(ListRequest),
    Stats { seq: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The event changed state (and possibly requested a fetch).
    Applied,
    /// The event was a no-op, e.g. navigating past the first or last page.
    Ignored,
    /// A completion for a request that has since been superseded.
    Stale,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub state: ViewState,
    pub fetch: Option<Fetch>,
    pub verdict: Verdict,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewState {
    committed: ListQuery,
    pages: u32,
    total: u64,
    pending: Option<ListRequest>,
    list_seq: u64,
    stats_seq: u64,
}

impl ViewState {
    pub fn new(page_size: u32) -> Self {
        Self {
            committed: ListQuery {
                page: 1,
                page_size: page_size.max(1),
                filters: PatientFilters::default(),
            },
            pages: 1,
            total: 0,
            pending: None,
            list_seq: 0,
            stats_seq: 0,
        }
    }

    /// Page currently displayed.
    pub fn page(&self) -> u32 {
        self.committed.page
    }

    pub fn pages(&self) -> u32 {
        self.pages
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Page size of the latest request (what the selector shows).
    pub fn page_size(&self) -> u32 {
        self.intent().page_size
    }

    /// Filters of the latest request (what the filter inputs show).
    pub fn filters(&self) -> &PatientFilters {
        &self.intent().filters
    }

    /// The list fetch still awaiting a response, if any.
    pub fn pending(&self) -> Option<&ListRequest> {
        self.pending.as_ref()
    }

    /// The query the operator most recently asked for.
    fn intent(&self) -> &ListQuery {
        self.pending
            .as_ref()
            .map(|p| &p.query)
            .unwrap_or(&self.committed)
    }

    /// Applies `event`, returning the next state and any fetch it requires.
    pub fn reduce(&self, event: ViewEvent) -> Transition {
        match event {
            ViewEvent::RiskFilterChanged(risk) => {
                let mut query = self.intent().clone();
                query.filters.risk = risk;
                query.page = 1;
                self.request_list(query)
            }
            ViewEvent::NameFilterChanged(name) => {
                let mut query = self.intent().clone();
                query.filters.name = name;
                query.page = 1;
                self.request_list(query)
            }
            ViewEvent::PageSizeChanged(0) => self.ignore(),
            ViewEvent::PageSizeChanged(page_size) => {
                let mut query = self.intent().clone();
                query.page_size = page_size;
                query.page = 1;
                self.request_list(query)
            }
            ViewEvent::PrevPage => {
                let query = self.intent();
                if query.page <= 1 {
                    return self.ignore();
                }
                let mut query = query.clone();
                query.page -= 1;
                self.request_list(query)
            }
            ViewEvent::NextPage => {
                // The page count belongs to the committed result set; it says nothing about a
                // filter or page size still in flight.
                if self.awaiting_new_result_set() {
                    return self.ignore();
                }
                let query = self.intent();
                if query.page >= self.pages {
                    return self.ignore();
                }
                let mut query = query.clone();
                query.page += 1;
                self.request_list(query)
            }
            ViewEvent::Reload => self.request_list(self.intent().clone()),
            ViewEvent::ListLoaded {
                seq,
                page,
                pages,
                total,
            } => self.commit_list(seq, page, pages, total),
            ViewEvent::ListFailed { seq } => {
                if !self.is_latest_list(seq) {
                    return self.stale();
                }
                let mut state = self.clone();
                state.pending = None;
                Transition {
                    state,
                    fetch: None,
                    verdict: Verdict::Applied,
                }
            }
            ViewEvent::StatsRequested => {
                let mut state = self.clone();
                state.stats_seq += 1;
                Transition {
                    fetch: Some(Fetch::Stats {
                        seq: state.stats_seq,
                    }),
                    state,
                    verdict: Verdict::Applied,
                }
            }
            ViewEvent::StatsLoaded { seq } => {
                if seq != self.stats_seq {
                    return self.stale();
                }
                Transition {
                    state: self.clone(),
                    fetch: None,
                    verdict: Verdict::Applied,
                }
            }
        }
    }

    fn awaiting_new_result_set(&self) -> bool {
        self.pending.as_ref().is_some_and(|p| {
            p.query.filters != self.committed.filters
                || p.query.page_size != self.committed.page_size
        })
    }

    fn is_latest_list(&self, seq: u64) -> bool {
        self.pending.as_ref().is_some_and(|p| p.seq == seq)
    }

    fn request_list(&self, query: ListQuery) -> Transition {
        let mut state = self.clone();
        state.list_seq += 1;
        let request = ListRequest {
            seq: state.list_seq,
            query,
        };
        state.pending = Some(request.clone());
        Transition {
            state,
            fetch: Some(Fetch::List(request)),
            verdict: Verdict::Applied,
        }
    }

    fn commit_list(&self, seq: u64, page: u32, pages: u32, total: u64) -> Transition {
        let Some(request) = self.pending.as_ref().filter(|p| p.seq == seq) else {
            return self.stale();
        };

        let pages = pages.max(1);
        let reported = page.max(1);
        let clamped = reported.min(pages);

        let mut state = self.clone();
        state.committed = ListQuery {
            page: clamped,
            ..request.query.clone()
        };
        state.pages = pages;
        state.total = total;
        state.pending = None;

        // The server served a page past the end (rows removed underneath us): show the last
        // real page instead of an empty one.
        if reported > pages {
            let query = state.committed.clone();
            return state.request_list(query);
        }

        Transition {
            state,
            fetch: None,
            verdict: Verdict::Applied,
        }
    }

    fn ignore(&self) -> Transition {
        Transition {
            state: self.clone(),
            fetch: None,
            verdict: Verdict::Ignored,
        }
    }

    fn stale(&self) -> Transition {
        Transition {
            state: self.clone(),
            fetch: None,
            verdict: Verdict::Stale,
        }
    }
}
