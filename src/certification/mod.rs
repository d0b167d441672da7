/// Certification metadata: capability parsing and curriculum ordering
///
/// Certification levels describe their limits in free text ("40m", "Nitrox up to
/// 40%", "Double + 2 Stages"). `capability` turns those strings into comparable
/// values and folds them per user; `ordering` arranges an organization's levels
/// into a progression.

pub mod capability;
pub mod ordering;

pub use capability::{aggregate, capabilities_for_user, CapabilityStats, TrimixTier};
pub use ordering::{curriculum, curriculum_for, order, CourseDetail, Curriculum};
