/*!

Min-max link fairness over a two-tier fabric.

* [controller] builds and solves the integer program of a control interval.
* [checkpoint] keeps the path cache of a controller between invocations.
* [jobs] and [grouping] support the offline analysis of colliding training jobs.

*/

pub mod controller;
pub mod checkpoint;
pub mod jobs;
pub mod grouping;

pub use self::controller::{Controller,ControllerState,FailureState,CandidatePath};
