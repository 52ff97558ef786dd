mod scripted;
mod slot;

pub use scripted::{demo_script, ScriptStep, ScriptedController};
pub use slot::{ReportSlot, SlotReader};
