use stencil::Model;

#[derive(Model)]
struct Person {
    #[stencil(rename = "Name")]
    first: String,
    #[stencil(rename = "Name")]
    last: String,
}

fn main() {}
