//! Typed fetchers for each LifeTracker domain
//!
//! Each fetcher borrows the shared [`ApiClient`](crate::api::ApiClient) and
//! maps one backend resource.

pub mod auth;
pub mod books;
pub mod dashboard;
pub mod expenses;
pub mod goals;
pub mod insights;
pub mod music;
pub mod notes;
pub mod settings;
pub mod spotify;

pub use auth::{AuthApi, CurrentUser, SignUp};
pub use books::{Book, BookFile, BookStats, BookStatus, BooksApi, NewBook, ProgressUpdate};
pub use dashboard::{Activity, DashboardApi, DashboardStats};
pub use expenses::{Expense, ExpenseStats, ExpensesApi, NewExpense};
pub use goals::{Goal, GoalStats, GoalsApi, NewGoal};
pub use insights::{Insight, InsightStats, InsightsApi};
pub use music::{MusicApi, MusicStats, NewTrack, Track};
pub use notes::{NewNote, Note, NoteStats, NotesApi};
pub use settings::{SettingsApi, UserProfile};
pub use spotify::{PlayingItem, SpotifyApi};
