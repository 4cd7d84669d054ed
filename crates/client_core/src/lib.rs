pub mod controller;
pub mod drafting;
pub mod error;
pub mod evaluation;
pub mod events;
pub mod flow;
pub mod homework_api;
pub mod notification;

pub use controller::{ControllerConfig, FlowController, PublishedHomework};
pub use error::ClientError;
pub use evaluation::{EvaluationClient, Evaluator, MissingEvaluator};
pub use events::{ControllerEvent, EventOutcome, Ticket};
pub use flow::{Flow, FlowError, FlowState, ReviewState, Screen, Step};
pub use homework_api::HomeworkServiceClient;
pub use notification::{NotificationKind, NotificationState};
