mod box_stack;
mod joints;
mod restitution;
