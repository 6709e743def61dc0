pub(crate) mod blend;
pub(crate) mod channel;
pub(crate) mod pack;
pub(crate) mod resample;
pub(crate) mod rows;
pub(crate) mod unpack;
