//! IFRS 9 style accounting attached to each note class.

pub mod impairment;
