use stencil::Model;

#[derive(Model)]
enum Shape {
    Circle,
}

fn main() {}
