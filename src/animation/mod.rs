pub(crate) mod ken_burns;
