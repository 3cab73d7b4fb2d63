pub mod simulation_form;

pub use simulation_form::SimulationForm;
