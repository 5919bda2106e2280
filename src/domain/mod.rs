pub mod challenge;
pub mod entity;
pub mod ladder;
pub mod locomotion;
pub mod physics;
