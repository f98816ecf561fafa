mod devices;
mod diffusion;
mod occupants;
