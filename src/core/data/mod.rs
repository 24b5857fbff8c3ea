pub mod domain_set;
pub mod index_switch;
pub mod intern;
pub mod rendering_id;
pub mod slot;
pub mod unit;

pub use domain_set::{DomainSet, DomainSetError, Gridded1DSet, Linear1DSet, SampleOrder};
pub use index_switch::IndexSwitch;
pub use intern::{DomainSetCache, InternTable};
pub use rendering_id::RenderingId;
pub use slot::{REMOVAL_DELAY_FRAMES, SLOT_COUNT, Slot, SlotState};
pub use unit::{MISSING, ScalarValue, Unit, UnitError, is_missing};
