pub mod pgm;
